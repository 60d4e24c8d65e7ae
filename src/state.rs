use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tokio::sync::Mutex;

use crate::auth::session::SessionStore;
use crate::config::Config;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let sessions = SessionStore::new(config.session_ttl());
        Self {
            db,
            config,
            sessions: Arc::new(Mutex::new(sessions)),
        }
    }
}
