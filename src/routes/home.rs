use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::db;
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub blog_name: String,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.").into_response()
            }
        }
    }
}

/// Landing page linking to the author and reader areas.
pub async fn index(State(state): State<AppState>) -> AppResult<Response> {
    let conn = state.db.get()?;
    let settings = db::settings::load(&conn)?;

    Ok(Html(IndexTemplate {
        blog_name: settings.blog_name().to_string(),
    })
    .into_response())
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}
