//! Comment request handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::handlers::parse_article_id;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{CommentListResponse, CommentResponse};
use crate::services::comments;

/// `POST /api/comments/{articleId}`: comment on an article.
pub async fn create_comment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(article_id): Path<String>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<CommentResponse>)> {
    let article_id = parse_article_id(&article_id)?;
    let resp = comments::create(state.store.as_ref(), &user, article_id, &body).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// `GET /api/comments/{articleId}`: comments on an article, newest first.
pub async fn list_comments_handler(
    State(state): State<AppState>,
    Path(article_id): Path<String>,
) -> AppResult<Json<CommentListResponse>> {
    let article_id = parse_article_id(&article_id)?;
    Ok(Json(comments::list(state.store.as_ref(), article_id).await?))
}
