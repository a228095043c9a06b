//! Article request handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ApiJson;
use crate::handlers::parse_article_id;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    ArticleListResponse, ArticleResponse, CreateArticleRequest, MessageResponse,
};
use crate::services::articles;

/// `GET /api/articles`: list articles, newest first.
pub async fn list_articles_handler(
    State(state): State<AppState>,
) -> AppResult<Json<ArticleListResponse>> {
    Ok(Json(articles::list(state.store.as_ref()).await?))
}

/// `GET /api/articles/{id}`: one article with author and comments.
pub async fn get_article_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ArticleResponse>> {
    let id = parse_article_id(&id)?;
    Ok(Json(articles::get(state.store.as_ref(), id).await?))
}

/// `POST /api/articles`: create an article owned by the caller.
pub async fn create_article_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(body): ApiJson<CreateArticleRequest>,
) -> AppResult<(StatusCode, Json<ArticleResponse>)> {
    let resp = articles::create(state.store.as_ref(), &user, body).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// `PUT /api/articles/{id}`: update the caller's own article.
pub async fn update_article_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<ArticleResponse>> {
    let id = parse_article_id(&id)?;
    Ok(Json(
        articles::update(state.store.as_ref(), &user, id, &body).await?,
    ))
}

/// `DELETE /api/articles/{id}`: delete the caller's own article and its comments.
pub async fn delete_article_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_article_id(&id)?;
    Ok(Json(articles::delete(state.store.as_ref(), &user, id).await?))
}
