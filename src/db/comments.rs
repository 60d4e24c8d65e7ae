use rusqlite::{params, Connection};

use super::models::Comment;

/// Comments on an article, newest first.
pub fn for_article(conn: &Connection, article_id: i64) -> rusqlite::Result<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, comment, article_id, created FROM Comments
         WHERE article_id = ?1
         ORDER BY created DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![article_id], Comment::from_row)?;
    rows.collect()
}

pub fn insert(
    conn: &Connection,
    article_id: i64,
    name: &str,
    comment: &str,
    now: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO Comments (name, comment, article_id, created) VALUES (?1, ?2, ?3, ?4)",
        params![name, comment, article_id, now],
    )?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{articles, test_pool};

    #[test]
    fn comments_come_back_newest_first() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        let article = articles::create_draft(&mut conn, "Post", "body", "t0").unwrap();

        insert(&conn, article, "Ann", "first", "2024-01-01 10:00:00").unwrap();
        insert(&conn, article, "Ben", "second", "2024-01-01 11:00:00").unwrap();
        insert(&conn, article, "Cy", "third", "2024-01-01 11:00:00").unwrap();

        let comments: Vec<String> = for_article(&conn, article)
            .unwrap()
            .into_iter()
            .map(|c| c.comment)
            .collect();
        assert_eq!(comments, vec!["third", "second", "first"]);
    }

    #[test]
    fn comments_are_scoped_to_their_article() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        let one = articles::create_draft(&mut conn, "One", "1", "t0").unwrap();
        let two = articles::create_draft(&mut conn, "Two", "2", "t0").unwrap();
        insert(&conn, one, "Ann", "on one", "t1").unwrap();

        assert_eq!(for_article(&conn, one).unwrap().len(), 1);
        assert!(for_article(&conn, two).unwrap().is_empty());
    }
}
