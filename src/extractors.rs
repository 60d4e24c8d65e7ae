use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::auth::session::{cookie_value, SessionData};
use crate::error::AppError;
use crate::state::AppState;

/// The browser's session, if its cookie resolves to a live one.
/// Never rejects: a missing or expired session yields `token: None`.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession {
    pub token: Option<String>,
    pub data: SessionData,
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = cookie_value(&parts.headers, &state.config.auth.cookie_name) else {
            return Ok(CurrentSession::default());
        };

        let data = state.sessions.lock().await.get(token);
        Ok(match data {
            Some(data) => CurrentSession {
                token: Some(token.to_string()),
                data,
            },
            None => CurrentSession::default(),
        })
    }
}

/// Logged-in author. Requests without one are redirected to the login page.
#[derive(Debug, Clone)]
pub struct CurrentAuthor {
    pub user_id: i64,
}

impl FromRequestParts<AppState> for CurrentAuthor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = CurrentSession::from_request_parts(parts, state).await?;
        match (session.token, session.data.user_id) {
            (Some(_), Some(user_id)) => Ok(CurrentAuthor { user_id }),
            _ => Err(AppError::LoginRequired),
        }
    }
}

/// Article id from the `{id}` path segment. Segments that do not parse as an
/// integer reject with 404.
#[derive(Debug, Clone, Copy)]
pub struct ArticleId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for ArticleId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;
        raw.parse().map(ArticleId).map_err(|_| AppError::NotFound)
    }
}
