use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    /// Author-only route hit without a logged-in session.
    #[error("Login required")]
    LoginRequired,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("Internal error: {0}")]
    Internal(String),
}

const GENERIC_FAILURE: &str = "Something went wrong.";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            AppError::LoginRequired => Redirect::to("/author/login").into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE).into_response()
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE).into_response()
            }
            AppError::Password(e) => {
                tracing::error!("Password hashing error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE).into_response()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE).into_response()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
