use askama::Template;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{clear_session_cookie, session_cookie, SessionData};
use crate::db;
use crate::db::models::{Article, Settings, AUTHOR};
use crate::db::users::{NewUser, Registration};
use crate::error::{AppError, AppResult};
use crate::extractors::{ArticleId, CurrentAuthor, CurrentSession};
use crate::routes::home::Html;
use crate::state::AppState;

const USERNAME_REQUIRED: &str = "Username is required.";
const USERNAME_HAS_SPACES: &str =
    "Username cannot contain spaces. Please choose a username without spaces.";
const USERNAME_TAKEN: &str =
    "The username you have chosen is already in use. Please select a different username.";
const USER_NOT_FOUND: &str = "User not found. Please create an account.";
const WRONG_PASSWORD: &str = "Password entered is incorrect. Please ensure you have entered the correct password for your account.";

// -- Templates --

#[derive(Template)]
#[template(path = "pages/author_register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/author_login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/author_home.html")]
pub struct AuthorHomeTemplate {
    pub settings: Settings,
    pub draft_articles: Vec<Article>,
    pub published_articles: Vec<Article>,
    pub notice: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "pages/author_settings.html")]
pub struct SettingsTemplate {
    pub settings: Settings,
    pub notice: Option<&'static str>,
}

/// Shared by the new-draft and edit pages.
#[derive(Template)]
#[template(path = "pages/author_edit.html")]
pub struct EditTemplate {
    pub settings: Settings,
    pub heading: &'static str,
    pub action: String,
    pub title: String,
    pub content: String,
}

// -- Request types --

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterForm {
    pub name: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ArticleForm {
    pub title: String,
    pub content: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SettingsForm {
    pub blog_name: String,
    pub author_name: String,
}

/// Hidden `id` field of the publish and delete forms.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct IdForm {
    pub id: String,
}

impl IdForm {
    /// A missing id is a malformed form; one that is not an integer names no
    /// article.
    fn article_id(&self) -> AppResult<i64> {
        let raw = self.id.trim();
        if raw.is_empty() {
            return Err(AppError::BadRequest("Missing article id".to_string()));
        }
        raw.parse().map_err(|_| AppError::NotFound)
    }
}

#[derive(Deserialize, Default)]
pub struct SuccessQuery {
    pub success: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/author/register", get(register_page).post(register))
        .route("/author/login", get(login_page).post(login))
        .route("/author/logout", post(logout))
        .route("/author/home", get(home).post(publish))
        .route("/author/settings", get(settings_page).post(update_settings))
        .route("/author/new", get(new_page).post(create_draft))
        .route("/author/edit/{id}", get(edit_page).post(update_article))
        .route("/author/delete", post(delete_article))
}

// -- Registration and login --

async fn register_page() -> impl IntoResponse {
    Html(RegisterTemplate { error: None })
}

fn register_error(message: &str) -> Response {
    Html(RegisterTemplate {
        error: Some(message.to_string()),
    })
    .into_response()
}

/// POST /author/register — create an author account, then send them to login
async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if form.username.is_empty() {
        return Ok(register_error(USERNAME_REQUIRED));
    }
    if form.username.chars().any(char::is_whitespace) {
        return Ok(register_error(USERNAME_HAS_SPACES));
    }

    let password_hash = hash_password(form.password, state.config.auth.bcrypt_cost).await?;

    let mut conn = state.db.get()?;
    let outcome = db::users::register(
        &mut conn,
        &NewUser {
            name: form.name.trim(),
            username: &form.username,
            password_hash: &password_hash,
        },
    )?;

    match outcome {
        Registration::Created(id) => {
            tracing::info!(user_id = id, username = %form.username, "Registered author");
            Ok(Redirect::to("/author/login").into_response())
        }
        Registration::UsernameTaken => Ok(register_error(USERNAME_TAKEN)),
    }
}

async fn login_page() -> impl IntoResponse {
    Html(LoginTemplate { error: None })
}

fn login_error(message: &str) -> Response {
    Html(LoginTemplate {
        error: Some(message.to_string()),
    })
    .into_response()
}

/// POST /author/login — verify credentials, claim the blog's author setting
/// and bind the user to a fresh session token.
async fn login(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let user = {
        let conn = state.db.get()?;
        db::users::find_by_username(&conn, &form.username)?
    };
    let Some(user) = user else {
        return Ok(login_error(USER_NOT_FOUND));
    };

    if !verify_password(form.password, user.password_hash.clone()).await? {
        tracing::warn!(username = %user.username, "Rejected login with wrong password");
        return Ok(login_error(WRONG_PASSWORD));
    }

    {
        let conn = state.db.get()?;
        db::settings::set(&conn, AUTHOR, &user.name)?;
    }

    // Rotate the token on login; likes from the anonymous session carry over.
    let token = {
        let mut sessions = state.sessions.lock().await;
        let liked_articles = session
            .token
            .as_deref()
            .and_then(|old| sessions.remove(old))
            .map(|data| data.liked_articles)
            .unwrap_or_default();
        sessions.create(SessionData {
            user_id: Some(user.id),
            liked_articles,
        })
    };

    tracing::info!(user_id = user.id, "Author logged in");
    let cookie = session_cookie(&state.config.auth.cookie_name, &token);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/author/home")).into_response())
}

async fn logout(State(state): State<AppState>, session: CurrentSession) -> Response {
    if let Some(token) = session.token {
        state.sessions.lock().await.remove(&token);
    }
    let cookie = clear_session_cookie(&state.config.auth.cookie_name);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/author/login")).into_response()
}

// -- Author home and publishing --

fn home_notice(success: Option<&str>) -> Option<&'static str> {
    match success? {
        "1" => Some("Article published."),
        "2" => Some("Draft created."),
        "3" => Some("Draft saved."),
        "4" => Some("Article deleted."),
        _ => None,
    }
}

async fn home(
    State(state): State<AppState>,
    _author: CurrentAuthor,
    Query(query): Query<SuccessQuery>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let settings = db::settings::load(&conn)?;
    let draft_articles = db::articles::drafts(&conn)?;
    let published_articles = db::articles::published(&conn)?;

    Ok(Html(AuthorHomeTemplate {
        settings,
        draft_articles,
        published_articles,
        notice: home_notice(query.success.as_deref()),
    })
    .into_response())
}

/// POST /author/home — publish a draft
async fn publish(
    State(state): State<AppState>,
    author: CurrentAuthor,
    Form(form): Form<IdForm>,
) -> AppResult<Response> {
    let id = form.article_id()?;
    let conn = state.db.get()?;
    if db::articles::publish(&conn, id, &db::timestamp())? {
        tracing::info!(user_id = author.user_id, article_id = id, "Published article");
    } else if db::articles::find(&conn, id)?.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(Redirect::to("/author/home?success=1").into_response())
}

// -- Settings --

async fn settings_page(
    State(state): State<AppState>,
    _author: CurrentAuthor,
    Query(query): Query<SuccessQuery>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let settings = db::settings::load(&conn)?;
    let notice = (query.success.as_deref() == Some("yes")).then_some("Settings saved.");

    Ok(Html(SettingsTemplate { settings, notice }).into_response())
}

async fn update_settings(
    State(state): State<AppState>,
    _author: CurrentAuthor,
    Form(form): Form<SettingsForm>,
) -> AppResult<Response> {
    let mut conn = state.db.get()?;
    db::settings::update_blog(&mut conn, form.blog_name.trim(), form.author_name.trim())?;
    Ok(Redirect::to("/author/settings?success=yes").into_response())
}

// -- Drafts --

async fn new_page(State(state): State<AppState>, _author: CurrentAuthor) -> AppResult<Response> {
    let conn = state.db.get()?;
    let settings = db::settings::load(&conn)?;

    Ok(Html(EditTemplate {
        settings,
        heading: "New draft",
        action: "/author/new".to_string(),
        title: String::new(),
        content: String::new(),
    })
    .into_response())
}

async fn create_draft(
    State(state): State<AppState>,
    author: CurrentAuthor,
    Form(form): Form<ArticleForm>,
) -> AppResult<Response> {
    let mut conn = state.db.get()?;
    let id = db::articles::create_draft(&mut conn, &form.title, &form.content, &db::timestamp())?;
    tracing::info!(user_id = author.user_id, article_id = id, "Created draft");
    Ok(Redirect::to("/author/home?success=2").into_response())
}

async fn edit_page(
    State(state): State<AppState>,
    _author: CurrentAuthor,
    ArticleId(id): ArticleId,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let settings = db::settings::load(&conn)?;
    let article = db::articles::find(&conn, id)?.ok_or(AppError::NotFound)?;

    Ok(Html(EditTemplate {
        settings,
        heading: "Edit article",
        action: format!("/author/edit/{}", article.id),
        title: article.title,
        content: article.content,
    })
    .into_response())
}

async fn update_article(
    State(state): State<AppState>,
    _author: CurrentAuthor,
    ArticleId(id): ArticleId,
    Form(form): Form<ArticleForm>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    if !db::articles::update_draft(&conn, id, &form.title, &form.content, &db::timestamp())? {
        return Err(AppError::NotFound);
    }
    Ok(Redirect::to("/author/home?success=3").into_response())
}

async fn delete_article(
    State(state): State<AppState>,
    author: CurrentAuthor,
    Form(form): Form<IdForm>,
) -> AppResult<Response> {
    let id = form.article_id()?;
    let conn = state.db.get()?;
    if db::articles::delete(&conn, id)? {
        tracing::info!(user_id = author.user_id, article_id = id, "Deleted article");
    }
    Ok(Redirect::to("/author/home?success=4").into_response())
}
