//! Custom extractors and deferred body parsing.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// Deserialize a raw JSON body.
///
/// Used where the body must only be read after the target resource has been
/// loaded and the caller's ownership confirmed.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}

/// `Json<T>` whose rejection renders as the API's `{"error"}` body (400).
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateCommentRequest;

    #[test]
    fn parses_valid_body() {
        let req: CreateCommentRequest = parse_json(br#"{"content":"hi"}"#).unwrap();
        assert_eq!(req.content, "hi");
    }

    #[test]
    fn bad_bodies_are_validation_errors() {
        for body in [&b""[..], b"{not json", b"{}", br#"{"content":5}"#] {
            assert!(matches!(
                parse_json::<CreateCommentRequest>(body),
                Err(AppError::Validation(_))
            ));
        }
    }
}
