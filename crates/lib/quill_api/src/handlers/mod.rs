//! Request handlers.

pub mod articles;
pub mod auth;
pub mod comments;

use crate::error::{AppError, AppResult};

/// Parse a numeric article id from a path segment.
pub(crate) fn parse_article_id(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| AppError::Validation("Invalid article ID".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_parse() {
        assert_eq!(parse_article_id("42").unwrap(), 42);
    }

    #[test]
    fn non_numeric_ids_are_rejected() {
        for raw in ["abc", "", "1.5", "99999999999999999999"] {
            assert!(matches!(
                parse_article_id(raw),
                Err(AppError::Validation(m)) if m == "Invalid article ID"
            ));
        }
    }
}
