//! Comment service.

use quill_core::models::blog::CommentWithUser;
use quill_core::store::{BlogStore, StoreError};
use quill_core::validation;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::extract::parse_json;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{CommentListResponse, CommentResponse, CreateCommentRequest};
use crate::services::articles::{article_not_found, load_article};

/// Comment on an existing article. `body` is parsed after the article lookup.
pub async fn create(
    store: &dyn BlogStore,
    user: &AuthenticatedUser,
    article_id: i64,
    body: &[u8],
) -> AppResult<CommentResponse> {
    let article = load_article(store, article_id).await?;
    let req: CreateCommentRequest = parse_json(body)?;
    validation::validate_new_comment(&req.content)?;

    // The article can be deleted between the lookup and the insert.
    let comment = match store
        .create_comment(article.id, user.user_id, &req.content)
        .await
    {
        Err(StoreError::MissingReference(_)) => return Err(article_not_found()),
        other => other?,
    };
    let author = store
        .find_user_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("user {} vanished", user.user_id)))?;
    info!(comment_id = comment.id, article_id, "comment created");

    Ok(CommentResponse {
        message: "Comment created successfully".into(),
        comment: CommentWithUser {
            comment,
            user: author,
        },
    })
}

/// Comments on an article, newest first. Unknown articles yield an empty list.
pub async fn list(store: &dyn BlogStore, article_id: i64) -> AppResult<CommentListResponse> {
    let comments = store.list_comments(article_id).await?;
    Ok(CommentListResponse { comments })
}
