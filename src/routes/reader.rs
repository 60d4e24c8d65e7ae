use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;

use crate::db;
use crate::db::models::{Article, ArticleWithComments, Comment, Settings};
use crate::error::{AppError, AppResult};
use crate::extractors::{ArticleId, CurrentSession};
use crate::routes::home::Html;
use crate::state::AppState;

const ALREADY_LIKED: &str = "You have liked this article";
const REGISTER_TO_LIKE: &str =
    "Only registered users can like this article. Please create an account to proceed.";
const INCOMPLETE_COMMENT: &str =
    "Both Name and Comment fields must be filled if either is provided.";

#[derive(Template)]
#[template(path = "pages/reader_home.html")]
pub struct ReaderHomeTemplate {
    pub settings: Settings,
    pub published_articles: Vec<Article>,
}

#[derive(Template)]
#[template(path = "pages/reader_article.html")]
pub struct ArticleTemplate {
    pub settings: Settings,
    pub article: Article,
    pub comments: Vec<Comment>,
    pub error: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ArticleActionForm {
    pub action: String,
    pub name: String,
    pub comment: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reader/home", get(home))
        .route("/reader/views/{id}", get(record_view))
        .route("/reader/article/{id}", get(article).post(article_action))
}

async fn home(State(state): State<AppState>) -> AppResult<Response> {
    let conn = state.db.get()?;
    let settings = db::settings::load(&conn)?;
    let published_articles = db::articles::published(&conn)?;

    Ok(Html(ReaderHomeTemplate {
        settings,
        published_articles,
    })
    .into_response())
}

/// GET /reader/views/{id} — count a view, then show the article.
/// Every hit counts, refreshes included.
async fn record_view(
    State(state): State<AppState>,
    ArticleId(id): ArticleId,
) -> AppResult<Redirect> {
    let conn = state.db.get()?;
    if !db::articles::record_view(&conn, id)? {
        return Err(AppError::NotFound);
    }
    Ok(Redirect::to(&format!("/reader/article/{}", id)))
}

/// Article page with settings and comments, optionally carrying an advisory.
fn render_article(state: &AppState, id: i64, advisory: Option<&str>) -> AppResult<Response> {
    let conn = state.db.get()?;
    let settings = db::settings::load(&conn)?;
    let ArticleWithComments { article, comments } =
        db::articles::with_comments(&conn, id)?.ok_or(AppError::NotFound)?;

    Ok(Html(ArticleTemplate {
        settings,
        article,
        comments,
        error: advisory.map(str::to_string),
    })
    .into_response())
}

async fn article(State(state): State<AppState>, ArticleId(id): ArticleId) -> AppResult<Response> {
    render_article(&state, id, None)
}

/// POST /reader/article/{id} — `action` is either `like` or `comment`.
/// Anonymous readers get the registration advisory for anything but a comment.
async fn article_action(
    State(state): State<AppState>,
    ArticleId(id): ArticleId,
    session: CurrentSession,
    Form(form): Form<ArticleActionForm>,
) -> AppResult<Response> {
    match form.action.as_str() {
        "comment" => add_comment(&state, id, &form.name, &form.comment),
        "like" => like(&state, id, session).await,
        _ if !session.data.is_authenticated() => {
            render_article(&state, id, Some(REGISTER_TO_LIKE))
        }
        other => Err(AppError::BadRequest(format!("Unknown action: {}", other))),
    }
}

async fn like(state: &AppState, id: i64, session: CurrentSession) -> AppResult<Response> {
    let token = match session.token {
        Some(token) if session.data.is_authenticated() => token,
        _ => return render_article(state, id, Some(REGISTER_TO_LIKE)),
    };

    // Check-and-mark under the store lock so concurrent likes from one
    // session cannot both pass.
    let first_like = state
        .sessions
        .lock()
        .await
        .update(&token, |data| data.record_like(id));

    match first_like {
        None => render_article(state, id, Some(REGISTER_TO_LIKE)),
        Some(false) => render_article(state, id, Some(ALREADY_LIKED)),
        Some(true) => match increment_likes(state, id) {
            Ok(true) => Ok(Redirect::to(&format!("/reader/article/{}", id)).into_response()),
            outcome => {
                state
                    .sessions
                    .lock()
                    .await
                    .update(&token, |data| data.liked_articles.remove(&id));
                outcome.and(Err(AppError::NotFound))
            }
        },
    }
}

fn increment_likes(state: &AppState, id: i64) -> AppResult<bool> {
    let conn = state.db.get()?;
    Ok(db::articles::record_like(&conn, id)?)
}

fn add_comment(state: &AppState, id: i64, name: &str, comment: &str) -> AppResult<Response> {
    let (name, comment) = (name.trim(), comment.trim());

    match (name.is_empty(), comment.is_empty()) {
        (true, true) => render_article(state, id, None),
        (false, false) => {
            {
                let conn = state.db.get()?;
                if db::articles::find(&conn, id)?.is_none() {
                    return Err(AppError::NotFound);
                }
                db::comments::insert(&conn, id, name, comment, &db::timestamp())?;
            }
            tracing::info!(article_id = id, "Comment added");
            render_article(state, id, None)
        }
        _ => Err(AppError::BadRequest(INCOMPLETE_COMMENT.to_string())),
    }
}
