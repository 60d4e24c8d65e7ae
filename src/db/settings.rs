use rusqlite::{params, Connection, TransactionBehavior};

use super::models::{Settings, AUTHOR, BLOG_NAME};

pub fn load(conn: &Connection) -> rusqlite::Result<Settings> {
    let mut stmt = conn.prepare("SELECT id, value FROM Settings")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    Ok(Settings(rows.collect::<Result<_, _>>()?))
}

pub fn set(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO Settings (id, value) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Blog name and author are written together or not at all.
pub fn update_blog(conn: &mut Connection, blog_name: &str, author: &str) -> rusqlite::Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    set(&tx, BLOG_NAME, blog_name)?;
    set(&tx, AUTHOR, author)?;
    tx.commit()
}
