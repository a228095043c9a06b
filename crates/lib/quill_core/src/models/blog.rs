//! Article and comment models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::auth::User;

/// An article owned by its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment on an article, owned by the commenting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub article_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Article with its author loaded.
///
/// Serializes flat: the article fields plus an `author` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleWithAuthor {
    #[serde(flatten)]
    pub article: Article,
    pub author: User,
}

/// Comment with its author loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentWithUser {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: User,
}

/// Partial update of an article. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl ArticlePatch {
    /// Apply the patch in place, returning whether anything changed.
    pub fn apply(self, article: &mut Article) -> bool {
        let mut changed = false;
        if let Some(title) = self.title {
            changed |= article.title != title;
            article.title = title;
        }
        if let Some(content) = self.content {
            changed |= article.content != content;
            article.content = content;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> Article {
        let now = Utc::now();
        Article {
            id: 1,
            title: "Hello".into(),
            content: "World".into(),
            author_id: 7,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: 7,
            username: "alice".into(),
            email: "a@x.com".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn patch_with_no_fields_leaves_article_unchanged() {
        let mut article = sample_article();
        let before = article.clone();
        assert!(!ArticlePatch::default().apply(&mut article));
        assert_eq!(article, before);
    }

    #[test]
    fn patch_replaces_only_given_fields() {
        let mut article = sample_article();
        let changed = ArticlePatch {
            title: Some("New title".into()),
            content: None,
        }
        .apply(&mut article);
        assert!(changed);
        assert_eq!(article.title, "New title");
        assert_eq!(article.content, "World");
    }

    #[test]
    fn article_with_author_serializes_flat() {
        let view = ArticleWithAuthor {
            article: sample_article(),
            author: sample_user(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["author_id"], 7);
        assert_eq!(json["author"]["username"], "alice");
        assert!(json["author"].get("password_hash").is_none());
    }
}
