use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::comments;
use super::models::{Article, ArticleCondition, ArticleWithComments, AUTHOR};

const ARTICLE_COLUMNS: &str =
    "id, condition, title, author, content, created, modified, published, views, likes";

/// Articles in the given condition, in the store's natural order.
pub fn list(conn: &Connection, condition: ArticleCondition) -> rusqlite::Result<Vec<Article>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM Articles WHERE condition = ?1",
        ARTICLE_COLUMNS
    ))?;
    let rows = stmt.query_map(params![condition], Article::from_row)?;
    rows.collect()
}

pub fn drafts(conn: &Connection) -> rusqlite::Result<Vec<Article>> {
    list(conn, ArticleCondition::Draft)
}

pub fn published(conn: &Connection) -> rusqlite::Result<Vec<Article>> {
    list(conn, ArticleCondition::Published)
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<Article>> {
    conn.query_row(
        &format!("SELECT {} FROM Articles WHERE id = ?1", ARTICLE_COLUMNS),
        params![id],
        Article::from_row,
    )
    .optional()
}

pub fn with_comments(conn: &Connection, id: i64) -> rusqlite::Result<Option<ArticleWithComments>> {
    let Some(article) = find(conn, id)? else {
        return Ok(None);
    };
    let comments = comments::for_article(conn, id)?;
    Ok(Some(ArticleWithComments { article, comments }))
}

/// New draft attributed to whoever the `author` setting currently names.
pub fn create_draft(
    conn: &mut Connection,
    title: &str,
    content: &str,
    now: &str,
) -> rusqlite::Result<i64> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let author: String = tx
        .query_row(
            "SELECT value FROM Settings WHERE id = ?1",
            params![AUTHOR],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or_default();

    tx.execute(
        "INSERT INTO Articles (condition, title, author, content, created, modified)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![ArticleCondition::Draft, title, author, content, now],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(id)
}

/// Updates title, content and modified time. Returns false for an unknown id.
pub fn update_draft(
    conn: &Connection,
    id: i64,
    title: &str,
    content: &str,
    now: &str,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE Articles SET title = ?1, content = ?2, modified = ?3 WHERE id = ?4",
        params![title, content, now, id],
    )?;
    Ok(changed > 0)
}

/// Draft → published. Already published articles are left untouched.
pub fn publish(conn: &Connection, id: i64, now: &str) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE Articles SET condition = ?1, published = ?2 WHERE id = ?3 AND condition = ?4",
        params![
            ArticleCondition::Published,
            now,
            id,
            ArticleCondition::Draft
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let changed = conn.execute("DELETE FROM Articles WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

pub fn record_view(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE Articles SET views = views + 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(changed > 0)
}

pub fn record_like(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE Articles SET likes = likes + 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(changed > 0)
}
