//! Route paths.

pub const POST_AUTH_REGISTER: &str = "/api/auth/register";
pub const POST_AUTH_LOGIN: &str = "/api/auth/login";

/// `GET` (public) and `POST` (protected).
pub const ARTICLES: &str = "/api/articles";
/// `GET` (public), `PUT` and `DELETE` (protected).
pub const ARTICLES_ID: &str = "/api/articles/{id}";
/// `GET` (public) and `POST` (protected).
pub const COMMENTS_ARTICLE_ID: &str = "/api/comments/{article_id}";
