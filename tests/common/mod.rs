#![allow(dead_code)]

use quill::config::Config;
use quill::db;
use quill::routes;
use quill::state::{AppState, DbPool};
use reqwest::{redirect, Client, Response};
use rusqlite::params;
use tempfile::TempDir;

/// A running server on an ephemeral port backed by a throwaway database.
pub struct TestApp {
    pub base_url: String,
    pub pool: DbPool,
    _data_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let data_dir = TempDir::new().unwrap();
        let pool = db::create_pool(&data_dir.path().join("test.db")).unwrap();
        db::run_migrations(&pool).unwrap();

        let mut config = Config::default();
        config.auth.bcrypt_cost = 4;
        let app = routes::router(AppState::new(pool.clone(), config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            pool,
            _data_dir: data_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// A browser-like client that keeps cookies but does not follow redirects.
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .unwrap()
    }

    pub async fn get(&self, client: &Client, path: &str) -> Response {
        client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post(&self, client: &Client, path: &str, form: &[(&str, &str)]) -> Response {
        client.post(self.url(path)).form(form).send().await.unwrap()
    }

    pub async fn register(
        &self,
        client: &Client,
        name: &str,
        username: &str,
        password: &str,
    ) -> Response {
        self.post(
            client,
            "/author/register",
            &[("name", name), ("username", username), ("password", password)],
        )
        .await
    }

    pub async fn login(&self, client: &Client, username: &str, password: &str) -> Response {
        self.post(
            client,
            "/author/login",
            &[("username", username), ("password", password)],
        )
        .await
    }

    /// Register and log in a fresh author on a new client.
    pub async fn logged_in_author(&self, name: &str, username: &str) -> Client {
        let client = self.client();
        self.register(&client, name, username, "secret").await;
        let response = self.login(&client, username, "secret").await;
        assert_eq!(location(&response), Some("/author/home".to_string()));
        client
    }

    pub fn published_article(&self, title: &str) -> i64 {
        let mut conn = self.pool.get().unwrap();
        let id = db::articles::create_draft(&mut conn, title, "Some content", "2024-01-01 09:00:00")
            .unwrap();
        db::articles::publish(&conn, id, "2024-01-01 10:00:00").unwrap();
        id
    }

    pub fn count(&self, sql: &str) -> i64 {
        let conn = self.pool.get().unwrap();
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    pub fn article_column<T: rusqlite::types::FromSql>(&self, id: i64, column: &str) -> T {
        let conn = self.pool.get().unwrap();
        conn.query_row(
            &format!("SELECT {} FROM Articles WHERE id = ?1", column),
            params![id],
            |row| row.get(0),
        )
        .unwrap()
    }

    pub fn setting(&self, key: &str) -> String {
        let conn = self.pool.get().unwrap();
        db::settings::load(&conn)
            .unwrap()
            .get(key)
            .unwrap_or_default()
            .to_string()
    }
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
