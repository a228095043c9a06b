//! In-memory store.
//!
//! Mirrors the PostgreSQL schema's constraints (unique username/email,
//! foreign keys, no cascading deletes) so the HTTP layer behaves identically
//! against either backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{BlogStore, Result, StoreError};
use crate::models::auth::{NewUser, User, UserWithPassword};
use crate::models::blog::{Article, ArticleWithAuthor, Comment, CommentWithUser};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, UserWithPassword>,
    articles: BTreeMap<i64, Article>,
    comments: BTreeMap<i64, Comment>,
    next_user_id: i64,
    next_article_id: i64,
    next_comment_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl Tables {
    fn user(&self, id: i64) -> Option<&User> {
        self.users.get(&id).map(|u| &u.user)
    }

    fn with_author(&self, article: &Article) -> Option<ArticleWithAuthor> {
        self.user(article.author_id).map(|author| ArticleWithAuthor {
            article: article.clone(),
            author: author.clone(),
        })
    }
}

/// Volatile store holding all tables behind a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().await.user(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserWithPassword>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.user.username == username)
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|u| u.user.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|u| u.user.email == email))
    }

    async fn create_user(&self, new_user: NewUser<'_>) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.user.username == new_user.username)
        {
            return Err(StoreError::Conflict("users_username_key".into()));
        }
        if tables.users.values().any(|u| u.user.email == new_user.email) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }

        let now = Utc::now();
        let user = User {
            id: next_id(&mut tables.next_user_id),
            username: new_user.username.to_string(),
            email: new_user.email.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(
            user.id,
            UserWithPassword {
                user: user.clone(),
                password_hash: new_user.password_hash.to_string(),
            },
        );
        Ok(user)
    }

    async fn list_articles(&self) -> Result<Vec<ArticleWithAuthor>> {
        let tables = self.tables.read().await;
        let mut articles: Vec<ArticleWithAuthor> = tables
            .articles
            .values()
            .filter_map(|a| tables.with_author(a))
            .collect();
        articles.sort_by(|a, b| {
            (b.article.created_at, b.article.id).cmp(&(a.article.created_at, a.article.id))
        });
        Ok(articles)
    }

    async fn find_article(&self, id: i64) -> Result<Option<Article>> {
        Ok(self.tables.read().await.articles.get(&id).cloned())
    }

    async fn find_article_with_author(&self, id: i64) -> Result<Option<ArticleWithAuthor>> {
        let tables = self.tables.read().await;
        Ok(tables.articles.get(&id).and_then(|a| tables.with_author(a)))
    }

    async fn create_article(&self, author_id: i64, title: &str, content: &str) -> Result<Article> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&author_id) {
            return Err(StoreError::MissingReference("articles_author_id_fkey".into()));
        }

        let now = Utc::now();
        let article = Article {
            id: next_id(&mut tables.next_article_id),
            title: title.to_string(),
            content: content.to_string(),
            author_id,
            created_at: now,
            updated_at: now,
        };
        tables.articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn update_article(&self, article: &Article) -> Result<Article> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .articles
            .get_mut(&article.id)
            .ok_or(StoreError::DbError(sqlx::Error::RowNotFound))?;
        stored.title = article.title.clone();
        stored.content = article.content.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_article(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.comments.values().any(|c| c.article_id == id) {
            return Err(StoreError::MissingReference("comments_article_id_fkey".into()));
        }
        Ok(tables.articles.remove(&id).is_some())
    }

    async fn delete_comments_for_article(&self, article_id: i64) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|_, c| c.article_id != article_id);
        Ok((before - tables.comments.len()) as u64)
    }

    async fn delete_article_with_comments(&self, id: i64) -> Result<Option<u64>> {
        let mut tables = self.tables.write().await;
        if tables.articles.remove(&id).is_none() {
            return Ok(None);
        }
        let before = tables.comments.len();
        tables.comments.retain(|_, c| c.article_id != id);
        Ok(Some((before - tables.comments.len()) as u64))
    }

    async fn create_comment(
        &self,
        article_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.articles.contains_key(&article_id) {
            return Err(StoreError::MissingReference("comments_article_id_fkey".into()));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::MissingReference("comments_user_id_fkey".into()));
        }

        let now = Utc::now();
        let comment = Comment {
            id: next_id(&mut tables.next_comment_id),
            content: content.to_string(),
            article_id,
            user_id,
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, article_id: i64) -> Result<Vec<CommentWithUser>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<CommentWithUser> = tables
            .comments
            .values()
            .filter(|c| c.article_id == article_id)
            .filter_map(|c| {
                tables.user(c.user_id).map(|user| CommentWithUser {
                    comment: c.clone(),
                    user: user.clone(),
                })
            })
            .collect();
        comments.sort_by(|a, b| {
            (b.comment.created_at, b.comment.id).cmp(&(a.comment.created_at, a.comment.id))
        });
        Ok(comments)
    }

    async fn count_comments(&self, article_id: i64) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|c| c.article_id == article_id)
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(store: &MemoryStore, name: &str) -> User {
        let email = format!("{name}@x.com");
        store
            .create_user(NewUser {
                username: name,
                email: &email,
                password_hash: "hash",
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn user_ids_are_sequential_and_positive() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "alice").await;
        let b = seed_user(&store, "bob").await;
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let store = MemoryStore::new();
        seed_user(&store, "alice").await;
        let err = store
            .create_user(NewUser {
                username: "alice",
                email: "other@x.com",
                password_hash: "hash",
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(c) if c == "users_username_key"));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        seed_user(&store, "alice").await;
        let err = store
            .create_user(NewUser {
                username: "alice2",
                email: "alice@x.com",
                password_hash: "hash",
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(c) if c == "users_email_key"));
    }

    #[tokio::test]
    async fn lookup_by_username_carries_hash() {
        let store = MemoryStore::new();
        seed_user(&store, "alice").await;
        let found = store.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "hash");
        assert!(store.find_user_by_username("bob").await.unwrap().is_none());
        assert!(store.username_exists("alice").await.unwrap());
        assert!(store.email_exists("alice@x.com").await.unwrap());
        assert!(!store.email_exists("bob@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn articles_list_newest_first_with_author() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let first = store.create_article(alice.id, "first", "c").await.unwrap();
        let second = store.create_article(alice.id, "second", "c").await.unwrap();

        let list = store.list_articles().await.unwrap();
        let ids: Vec<i64> = list.iter().map(|a| a.article.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(list[0].author, alice);
    }

    #[tokio::test]
    async fn article_for_unknown_author_is_rejected() {
        let store = MemoryStore::new();
        let err = store.create_article(42, "t", "c").await.unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));
    }

    #[tokio::test]
    async fn update_persists_fields_and_bumps_timestamp() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let mut article = store.create_article(alice.id, "t", "c").await.unwrap();
        article.title = "new".into();

        let updated = store.update_article(&article).await.unwrap();
        assert_eq!(updated.title, "new");
        assert!(updated.updated_at >= updated.created_at);
        assert_eq!(
            store.find_article(article.id).await.unwrap().unwrap().title,
            "new"
        );
    }

    #[tokio::test]
    async fn article_with_comments_cannot_be_deleted_directly() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let article = store.create_article(alice.id, "t", "c").await.unwrap();
        store.create_comment(article.id, alice.id, "one").await.unwrap();
        store.create_comment(article.id, alice.id, "two").await.unwrap();

        assert!(matches!(
            store.delete_article(article.id).await,
            Err(StoreError::MissingReference(_))
        ));

        assert_eq!(store.delete_comments_for_article(article.id).await.unwrap(), 2);
        assert_eq!(store.count_comments(article.id).await.unwrap(), 0);
        assert!(store.delete_article(article.id).await.unwrap());
        assert!(store.find_article(article.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn article_and_comments_are_deleted_together() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let article = store.create_article(alice.id, "t", "c").await.unwrap();
        let other = store.create_article(alice.id, "o", "c").await.unwrap();
        store.create_comment(article.id, alice.id, "one").await.unwrap();
        store.create_comment(article.id, alice.id, "two").await.unwrap();
        store.create_comment(other.id, alice.id, "stays").await.unwrap();

        assert_eq!(
            store.delete_article_with_comments(article.id).await.unwrap(),
            Some(2)
        );
        assert!(store.find_article(article.id).await.unwrap().is_none());
        assert_eq!(store.count_comments(other.id).await.unwrap(), 1);
        assert_eq!(
            store.delete_article_with_comments(article.id).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn comments_are_scoped_to_their_article() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let a = store.create_article(alice.id, "a", "c").await.unwrap();
        let b = store.create_article(alice.id, "b", "c").await.unwrap();
        store.create_comment(a.id, bob.id, "on a").await.unwrap();
        let latest = store.create_comment(a.id, alice.id, "also on a").await.unwrap();
        store.create_comment(b.id, bob.id, "on b").await.unwrap();

        let comments = store.list_comments(a.id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].comment.id, latest.id);
        assert_eq!(comments[0].user, alice);
        assert_eq!(comments[1].user, bob);
        assert_eq!(store.count_comments(b.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn comment_on_missing_article_is_rejected() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let err = store.create_comment(99, alice.id, "hi").await.unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));
    }
}
