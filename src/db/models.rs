use std::collections::BTreeMap;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub password_hash: String,
}

impl User {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            username: row.get("username")?,
            password_hash: row.get("password")?,
        })
    }
}

/// Lifecycle state of an article. Drafts become published exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleCondition {
    Draft,
    Published,
}

impl ArticleCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleCondition::Draft => "draft",
            ArticleCondition::Published => "published",
        }
    }
}

impl ToSql for ArticleCondition {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ArticleCondition {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "draft" => Ok(ArticleCondition::Draft),
            "published" => Ok(ArticleCondition::Published),
            other => Err(FromSqlError::Other(
                format!("unknown article condition: {}", other).into(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Article {
    pub id: i64,
    pub condition: ArticleCondition,
    pub title: String,
    /// Author name as it was when the draft was created.
    pub author: String,
    pub content: String,
    pub created: String,
    pub modified: String,
    pub published: Option<String>,
    pub views: i64,
    pub likes: i64,
}

impl Article {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            condition: row.get("condition")?,
            title: row.get("title")?,
            author: row.get("author")?,
            content: row.get("content")?,
            created: row.get("created")?,
            modified: row.get("modified")?,
            published: row.get("published")?,
            views: row.get("views")?,
            likes: row.get("likes")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub name: String,
    pub comment: String,
    pub article_id: i64,
    pub created: String,
}

impl Comment {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            comment: row.get("comment")?,
            article_id: row.get("article_id")?,
            created: row.get("created")?,
        })
    }
}

pub const BLOG_NAME: &str = "blog_name";
pub const AUTHOR: &str = "author";

/// Every settings row, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Settings(pub BTreeMap<String, String>);

impl Settings {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn blog_name(&self) -> &str {
        self.get(BLOG_NAME).unwrap_or_default()
    }

    pub fn author(&self) -> &str {
        self.get(AUTHOR).unwrap_or_default()
    }
}

/// An article together with its comments, newest comment first.
#[derive(Debug, Clone)]
pub struct ArticleWithComments {
    pub article: Article,
    pub comments: Vec<Comment>,
}
