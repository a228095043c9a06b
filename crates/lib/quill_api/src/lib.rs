//! # quill_api
//!
//! HTTP API library for Quill.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use quill_core::auth::jwt::TokenService;
use quill_core::store::BlogStore;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::handlers::{articles, auth, comments};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Persistence collaborator.
    pub store: Arc<dyn BlogStore>,
    /// API configuration.
    pub config: ApiConfig,
    /// Token service built once from `config`.
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(store: Arc<dyn BlogStore>, config: ApiConfig) -> Self {
        let tokens = Arc::new(TokenService::with_ttl_hours(
            config.jwt_secret.as_bytes(),
            config.jwt_ttl_hours,
        ));
        Self {
            store,
            config,
            tokens,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `quill_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    quill_core::migrate::migrate(pool).await
}

/// Render a handler panic as a plain 500 with the standard error body.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers(cors::Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::ARTICLES, get(articles::list_articles_handler))
        .route(routes::ARTICLES_ID, get(articles::get_article_handler))
        .route(
            routes::COMMENTS_ARTICLE_ID,
            get(comments::list_comments_handler),
        );

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::ARTICLES, post(articles::create_article_handler))
        .route(
            routes::ARTICLES_ID,
            put(articles::update_article_handler).delete(articles::delete_article_handler),
        )
        .route(
            routes::COMMENTS_ARTICLE_ID,
            post(comments::create_comment_handler),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(cors),
        )
        .with_state(state)
}
