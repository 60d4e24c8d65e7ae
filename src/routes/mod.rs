pub mod assets;
pub mod author;
pub mod home;
pub mod reader;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full application: landing page, author and reader areas, assets.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .merge(author::router())
        .merge(reader::router())
        .fallback(home::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
