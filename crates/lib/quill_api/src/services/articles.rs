//! Article service.
//!
//! Mutations run in a fixed order: load (404) → ownership (403) → body and field
//! validation (400) → persist.

use quill_core::auth::ownership;
use quill_core::models::blog::{Article, ArticleWithAuthor};
use quill_core::store::BlogStore;
use quill_core::validation;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::extract::parse_json;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    ArticleListResponse, ArticleResponse, ArticleView, CreateArticleRequest, MessageResponse,
    UpdateArticleRequest,
};

pub(crate) fn article_not_found() -> AppError {
    AppError::NotFound("Article not found".into())
}

/// Load an article or fail with 404.
pub(crate) async fn load_article(store: &dyn BlogStore, id: i64) -> AppResult<Article> {
    store.find_article(id).await?.ok_or_else(article_not_found)
}

/// Re-read an article together with its author for the response body.
async fn load_with_author(store: &dyn BlogStore, id: i64) -> AppResult<ArticleWithAuthor> {
    store
        .find_article_with_author(id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("article {id} vanished after write")))
}

/// Require the caller to own the article.
fn ensure_owner(article: &Article, user: &AuthenticatedUser, action: &str) -> AppResult<()> {
    if ownership::authorize(article.author_id, user.user_id).is_allowed() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "You can only {action} your own articles"
        )))
    }
}

/// All articles, newest first.
pub async fn list(store: &dyn BlogStore) -> AppResult<ArticleListResponse> {
    let articles = store.list_articles().await?;
    Ok(ArticleListResponse {
        articles: articles.into_iter().map(ArticleView::from).collect(),
    })
}

/// One article with its author and comments.
pub async fn get(store: &dyn BlogStore, id: i64) -> AppResult<ArticleResponse> {
    let article = store
        .find_article_with_author(id)
        .await?
        .ok_or_else(article_not_found)?;
    let comments = store.list_comments(id).await?;
    Ok(ArticleResponse {
        message: None,
        article: ArticleView {
            article,
            comments: Some(comments),
        },
    })
}

pub async fn create(
    store: &dyn BlogStore,
    user: &AuthenticatedUser,
    req: CreateArticleRequest,
) -> AppResult<ArticleResponse> {
    validation::validate_new_article(&req.title, &req.content)?;

    let article = store
        .create_article(user.user_id, &req.title, &req.content)
        .await?;
    info!(article_id = article.id, user_id = user.user_id, "article created");

    Ok(ArticleResponse {
        message: Some("Article created successfully".into()),
        article: load_with_author(store, article.id).await?.into(),
    })
}

/// Update the caller's own article. `body` is parsed only once the article
/// is loaded and owned.
pub async fn update(
    store: &dyn BlogStore,
    user: &AuthenticatedUser,
    id: i64,
    body: &[u8],
) -> AppResult<ArticleResponse> {
    let mut article = load_article(store, id).await?;
    ensure_owner(&article, user, "update")?;

    let req: UpdateArticleRequest = parse_json(body)?;
    let patch = validation::validate_article_patch(req.title, req.content)?;
    patch.apply(&mut article);

    let article = store.update_article(&article).await?;
    info!(article_id = article.id, user_id = user.user_id, "article updated");

    Ok(ArticleResponse {
        message: Some("Article updated successfully".into()),
        article: load_with_author(store, article.id).await?.into(),
    })
}

/// Delete an article together with all of its comments.
pub async fn delete(
    store: &dyn BlogStore,
    user: &AuthenticatedUser,
    id: i64,
) -> AppResult<MessageResponse> {
    let article = load_article(store, id).await?;
    ensure_owner(&article, user, "delete")?;

    let removed = store
        .delete_article_with_comments(article.id)
        .await?
        .ok_or_else(article_not_found)?;
    info!(
        article_id = article.id,
        comments_removed = removed,
        "article deleted"
    );

    Ok(MessageResponse {
        message: "Article deleted successfully".into(),
    })
}
