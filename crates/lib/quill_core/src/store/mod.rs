//! Persistence collaborator.
//!
//! `BlogStore` abstracts over the storage backend so the HTTP layer receives
//! an explicit handle instead of a process-wide database singleton.
//!
//! Backends:
//! - [`PgStore`]: PostgreSQL via sqlx (production).
//! - [`MemoryStore`]: in-process tables (tests, `--in-memory` runs).

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{NewUser, User, UserWithPassword};
use crate::models::blog::{Article, ArticleWithAuthor, Comment, CommentWithUser};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A referenced row does not exist.
    #[error("Missing reference: {0}")]
    MissingReference(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Create/find/update/delete operations over users, articles and comments.
#[async_trait]
pub trait BlogStore: Send + Sync {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Fetch a user together with the password hash, for login.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserWithPassword>>;

    async fn username_exists(&self, username: &str) -> Result<bool>;

    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// Insert a user. Duplicate username or email yields `StoreError::Conflict`.
    async fn create_user(&self, new_user: NewUser<'_>) -> Result<User>;

    /// All articles with their authors, newest first.
    async fn list_articles(&self) -> Result<Vec<ArticleWithAuthor>>;

    async fn find_article(&self, id: i64) -> Result<Option<Article>>;

    async fn find_article_with_author(&self, id: i64) -> Result<Option<ArticleWithAuthor>>;

    async fn create_article(&self, author_id: i64, title: &str, content: &str) -> Result<Article>;

    /// Persist title and content of an existing article, bumping `updated_at`.
    async fn update_article(&self, article: &Article) -> Result<Article>;

    /// Delete a single article. Comments must be removed first.
    async fn delete_article(&self, id: i64) -> Result<bool>;

    /// Delete every comment on an article, returning how many were removed.
    async fn delete_comments_for_article(&self, article_id: i64) -> Result<u64>;

    /// Delete an article and its comments atomically. `None` if the article
    /// does not exist, otherwise the number of comments removed. Comments
    /// added concurrently either go with the article or fail their insert.
    async fn delete_article_with_comments(&self, id: i64) -> Result<Option<u64>>;

    async fn create_comment(&self, article_id: i64, user_id: i64, content: &str)
    -> Result<Comment>;

    /// Comments on an article with their authors, newest first.
    async fn list_comments(&self, article_id: i64) -> Result<Vec<CommentWithUser>>;

    async fn count_comments(&self, article_id: i64) -> Result<i64>;
}
