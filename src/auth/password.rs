use crate::error::{AppError, AppResult};

/// Hash a password with bcrypt on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {}", e)))?
        .map_err(AppError::from)
}
