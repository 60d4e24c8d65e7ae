use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use rand::Rng;

/// Per-browser session state. Presence of `user_id` means the browser is
/// logged in as an author.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Option<i64>,
    pub liked_articles: HashSet<i64>,
}

impl SessionData {
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Returns false when the article was already liked in this session.
    pub fn record_like(&mut self, article_id: i64) -> bool {
        self.liked_articles.insert(article_id)
    }
}

struct Entry {
    last_seen: Instant,
    data: SessionData,
}

/// In-memory session records keyed by cookie token. A session that sees no
/// traffic for `ttl` is dropped.
pub struct SessionStore {
    ttl: Duration,
    sessions: HashMap<String, Entry>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: HashMap::new(),
        }
    }

    /// Look up a live session and refresh its inactivity timer.
    pub fn get(&mut self, token: &str) -> Option<SessionData> {
        self.clear_stale();
        let entry = self.sessions.get_mut(token)?;
        entry.last_seen = Instant::now();
        Some(entry.data.clone())
    }

    /// Store a new session and return its token.
    pub fn create(&mut self, data: SessionData) -> String {
        self.clear_stale();
        let token = generate_token();
        self.sessions.insert(
            token.clone(),
            Entry {
                last_seen: Instant::now(),
                data,
            },
        );
        token
    }

    /// Mutate a live session in place. None if the token is unknown or expired.
    pub fn update<R>(&mut self, token: &str, f: impl FnOnce(&mut SessionData) -> R) -> Option<R> {
        self.clear_stale();
        let entry = self.sessions.get_mut(token)?;
        entry.last_seen = Instant::now();
        Some(f(&mut entry.data))
    }

    pub fn remove(&mut self, token: &str) -> Option<SessionData> {
        self.sessions.remove(token).map(|entry| entry.data)
    }

    fn clear_stale(&mut self) {
        let ttl = self.ttl;
        self.sessions
            .retain(|_, entry| entry.last_seen.elapsed() < ttl);
    }
}

// -- Cookie helpers --

pub fn session_cookie(name: &str, token: &str) -> String {
    format!("{}={}; HttpOnly; SameSite=Lax; Path=/", name, token)
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn author(user_id: i64) -> SessionData {
        SessionData {
            user_id: Some(user_id),
            ..SessionData::default()
        }
    }

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn create_then_get_returns_data() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        let token = store.create(author(7));
        let data = store.get(&token).unwrap();
        assert_eq!(data.user_id, Some(7));
        assert!(data.is_authenticated());
        assert!(store.get("unknown").is_none());
    }

    #[test]
    fn record_like_only_counts_once() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        let token = store.create(SessionData::default());
        assert_eq!(store.update(&token, |s| s.record_like(3)), Some(true));
        assert_eq!(store.update(&token, |s| s.record_like(3)), Some(false));
        assert_eq!(store.update(&token, |s| s.record_like(4)), Some(true));
        assert!(store.get(&token).unwrap().liked_articles.contains(&3));
    }

    #[test]
    fn update_on_unknown_token_is_none() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        assert!(store.update("nope", |s| s.record_like(1)).is_none());
    }

    #[test]
    fn idle_sessions_expire() {
        let mut store = SessionStore::new(Duration::from_millis(20));
        let token = store.create(author(1));
        std::thread::sleep(Duration::from_millis(60));
        assert!(store.get(&token).is_none());
        assert!(store.sessions.is_empty());
    }

    #[test]
    fn remove_returns_session_data() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        let token = store.create(author(9));
        assert_eq!(store.remove(&token).unwrap().user_id, Some(9));
        assert!(store.remove(&token).is_none());
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; quill_session=abc123"),
        );
        assert_eq!(cookie_value(&headers, "quill_session"), Some("abc123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let cookie = clear_session_cookie("quill_session");
        assert!(cookie.starts_with("quill_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
