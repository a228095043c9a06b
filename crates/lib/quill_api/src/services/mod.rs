//! Business logic behind the request handlers.

pub mod articles;
pub mod auth;
pub mod comments;
