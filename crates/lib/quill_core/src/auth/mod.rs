//! Authentication and authorization logic.
//!
//! Provides password hashing, JWT issuance/validation and the ownership
//! policy shared by the HTTP layer.

pub mod jwt;
pub mod ownership;
pub mod password;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHashFormat(String),

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature invalid")]
    SignatureInvalid,

    #[error("Token expired")]
    Expired,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl AuthError {
    /// Whether the error means "the caller is not authenticated" rather than
    /// an internal failure.
    pub fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::Malformed(_) | AuthError::SignatureInvalid | AuthError::Expired
        )
    }
}
