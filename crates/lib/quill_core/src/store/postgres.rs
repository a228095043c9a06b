//! PostgreSQL-backed store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{BlogStore, Result, StoreError};
use crate::models::auth::{NewUser, User, UserWithPassword};
use crate::models::blog::{Article, ArticleWithAuthor, Comment, CommentWithUser};

const USER_COLUMNS: &str = "id, username, email, created_at, updated_at";
const ARTICLE_COLUMNS: &str = "id, title, content, author_id, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, content, article_id, user_id, created_at, updated_at";

/// Store backed by a sqlx connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map constraint violations onto store errors.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        let constraint = db.constraint().unwrap_or("unknown").to_string();
        if db.is_unique_violation() {
            return StoreError::Conflict(constraint);
        }
        if db.is_foreign_key_violation() {
            return StoreError::MissingReference(constraint);
        }
    }
    StoreError::DbError(e)
}

#[derive(sqlx::FromRow)]
struct UserPasswordRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserPasswordRow> for UserWithPassword {
    fn from(row: UserPasswordRow) -> Self {
        UserWithPassword {
            user: User {
                id: row.id,
                username: row.username,
                email: row.email,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            password_hash: row.password_hash,
        }
    }
}

/// Article joined with its author.
#[derive(sqlx::FromRow)]
struct ArticleAuthorRow {
    id: i64,
    title: String,
    content: String,
    author_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_username: String,
    author_email: String,
    author_created_at: DateTime<Utc>,
    author_updated_at: DateTime<Utc>,
}

impl From<ArticleAuthorRow> for ArticleWithAuthor {
    fn from(row: ArticleAuthorRow) -> Self {
        ArticleWithAuthor {
            author: User {
                id: row.author_id,
                username: row.author_username,
                email: row.author_email,
                created_at: row.author_created_at,
                updated_at: row.author_updated_at,
            },
            article: Article {
                id: row.id,
                title: row.title,
                content: row.content,
                author_id: row.author_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

/// Comment joined with its author.
#[derive(sqlx::FromRow)]
struct CommentUserRow {
    id: i64,
    content: String,
    article_id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_username: String,
    user_email: String,
    user_created_at: DateTime<Utc>,
    user_updated_at: DateTime<Utc>,
}

impl From<CommentUserRow> for CommentWithUser {
    fn from(row: CommentUserRow) -> Self {
        CommentWithUser {
            user: User {
                id: row.user_id,
                username: row.user_username,
                email: row.user_email,
                created_at: row.user_created_at,
                updated_at: row.user_updated_at,
            },
            comment: Comment {
                id: row.id,
                content: row.content,
                article_id: row.article_id,
                user_id: row.user_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

const ARTICLE_WITH_AUTHOR_SELECT: &str = r#"
    SELECT a.id, a.title, a.content, a.author_id, a.created_at, a.updated_at,
           u.username AS author_username, u.email AS author_email,
           u.created_at AS author_created_at, u.updated_at AS author_updated_at
    FROM articles a
    JOIN users u ON u.id = a.author_id
"#;

#[async_trait]
impl BlogStore for PgStore {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserWithPassword>> {
        let row = sqlx::query_as::<_, UserPasswordRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserWithPassword::from))
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create_user(&self, new_user: NewUser<'_>) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new_user.username)
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn list_articles(&self) -> Result<Vec<ArticleWithAuthor>> {
        let rows = sqlx::query_as::<_, ArticleAuthorRow>(&format!(
            "{ARTICLE_WITH_AUTHOR_SELECT} ORDER BY a.created_at DESC, a.id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ArticleWithAuthor::from).collect())
    }

    async fn find_article(&self, id: i64) -> Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(article)
    }

    async fn find_article_with_author(&self, id: i64) -> Result<Option<ArticleWithAuthor>> {
        let row = sqlx::query_as::<_, ArticleAuthorRow>(&format!(
            "{ARTICLE_WITH_AUTHOR_SELECT} WHERE a.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ArticleWithAuthor::from))
    }

    async fn create_article(&self, author_id: i64, title: &str, content: &str) -> Result<Article> {
        sqlx::query_as::<_, Article>(&format!(
            "INSERT INTO articles (title, content, author_id) VALUES ($1, $2, $3) \
             RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(title)
        .bind(content)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn update_article(&self, article: &Article) -> Result<Article> {
        sqlx::query_as::<_, Article>(&format!(
            "UPDATE articles SET title = $1, content = $2, updated_at = now() \
             WHERE id = $3 RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(&article.title)
        .bind(&article.content)
        .bind(article.id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn delete_article(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_comments_for_article(&self, article_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE article_id = $1")
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_article_with_comments(&self, id: i64) -> Result<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        // Row lock blocks comment inserts, whose FK check needs a share lock.
        let locked =
            sqlx::query_scalar::<_, i64>("SELECT id FROM articles WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM comments WHERE article_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(Some(removed))
    }

    async fn create_comment(
        &self,
        article_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<Comment> {
        sqlx::query_as::<_, Comment>(&format!(
            "INSERT INTO comments (content, article_id, user_id) VALUES ($1, $2, $3) \
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(content)
        .bind(article_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn list_comments(&self, article_id: i64) -> Result<Vec<CommentWithUser>> {
        let rows = sqlx::query_as::<_, CommentUserRow>(
            r#"
            SELECT c.id, c.content, c.article_id, c.user_id, c.created_at, c.updated_at,
                   u.username AS user_username, u.email AS user_email,
                   u.created_at AS user_created_at, u.updated_at AS user_updated_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.article_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CommentWithUser::from).collect())
    }

    async fn count_comments(&self, article_id: i64) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE article_id = $1")
                .bind(article_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
