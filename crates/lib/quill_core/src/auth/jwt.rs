//! JWT token issuance and validation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;

use super::AuthError;
use crate::models::auth::TokenClaims;

/// Default token lifetime in hours.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Longest accepted token lifetime in hours (ten years).
pub const MAX_TTL_HOURS: i64 = 87_600;

/// Length of a generated signing secret.
const GENERATED_SECRET_LEN: usize = 64;

/// Signs and verifies time-bounded HS256 identity tokens.
///
/// Built once at startup from configuration and shared by reference.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Convenience constructor taking the TTL in hours.
    ///
    /// A TTL too large to represent saturates; `issue` then refuses to sign.
    pub fn with_ttl_hours(secret: &[u8], ttl_hours: i64) -> Self {
        Self::new(secret, Duration::try_hours(ttl_hours).unwrap_or(Duration::MAX))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a signed token for the given subject, valid from `now` for the
    /// configured TTL.
    pub fn issue(
        &self,
        user_id: i64,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        if self.ttl <= Duration::zero() {
            return Err(AuthError::Signing(format!(
                "token lifetime must be positive, got {}",
                self.ttl
            )));
        }
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Signing("token expiry out of range".into()))?;

        let claims = TokenClaims {
            user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(format!("jwt encode: {e}")))
    }

    /// Validate a token against the secret and the verifier's clock.
    ///
    /// Structure is checked before the signature; expiry is checked last,
    /// using `now` (zero leeway).
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        check_structure(token)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::SignatureInvalid
                }
                _ => AuthError::Malformed(e.to_string()),
            })?;

        let expires_at = claims
            .expires_at()
            .ok_or_else(|| AuthError::Malformed(format!("exp out of range: {}", claims.exp)))?;
        if now > expires_at {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

/// A compact JWS is exactly three non-empty, dot-separated segments.
fn check_structure(token: &str) -> Result<(), AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(AuthError::Malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }
    if segments.iter().any(|s| s.is_empty()) {
        return Err(AuthError::Malformed("empty segment".into()));
    }
    Ok(())
}

/// Resolve the JWT secret: env var `JWT_SECRET` → persisted file → generated.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    resolve_jwt_secret_at(&jwt_secret_path())
}

/// Read the secret persisted at `path`, generating and persisting a new one
/// if the file is missing or empty.
pub fn resolve_jwt_secret_at(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(path, &secret);
    info!(path = %path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quill")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn service() -> TokenService {
        TokenService::with_ttl_hours(SECRET, DEFAULT_TTL_HOURS)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn issued_token_validates_before_expiry() {
        let svc = service();
        let now = at(1_700_000_000);
        let token = svc.issue(5, "alice", now).unwrap();

        let claims = svc.validate(&token, now).unwrap();
        assert_eq!(claims.user_id, 5);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, (now + Duration::hours(24)).timestamp());

        let later = now + Duration::hours(23);
        assert_eq!(svc.validate(&token, later).unwrap().user_id, 5);
    }

    #[test]
    fn token_is_still_valid_at_exact_expiry() {
        let svc = service();
        let now = at(1_700_000_000);
        let token = svc.issue(5, "alice", now).unwrap();
        assert!(svc.validate(&token, now + svc.ttl()).is_ok());
    }

    #[test]
    fn token_past_expiry_is_rejected() {
        let svc = service();
        let now = at(1_700_000_000);
        let token = svc.issue(5, "alice", now).unwrap();

        let err = svc
            .validate(&token, now + svc.ttl() + Duration::seconds(1))
            .unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn fraction_of_a_second_past_expiry_is_rejected() {
        let svc = service();
        let now = at(1_700_000_000);
        let token = svc.issue(5, "alice", now).unwrap();

        let just_after = now + svc.ttl() + Duration::milliseconds(900);
        assert!(matches!(
            svc.validate(&token, just_after),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn unrepresentable_ttl_fails_to_sign() {
        let now = at(1_700_000_000);
        for hours in [10_000_000_000, i64::MAX] {
            let svc = TokenService::with_ttl_hours(SECRET, hours);
            assert!(matches!(
                svc.issue(5, "alice", now),
                Err(AuthError::Signing(_))
            ));
        }
    }

    #[test]
    fn non_positive_ttl_fails_to_sign() {
        let now = at(1_700_000_000);
        for hours in [0, -1] {
            let svc = TokenService::with_ttl_hours(SECRET, hours);
            assert!(matches!(
                svc.issue(5, "alice", now),
                Err(AuthError::Signing(_))
            ));
        }
    }

    #[test]
    fn ttl_comes_from_configuration() {
        let svc = TokenService::with_ttl_hours(SECRET, 1);
        let now = at(1_700_000_000);
        let token = svc.issue(1, "bob", now).unwrap();
        assert!(svc.validate(&token, now + Duration::minutes(59)).is_ok());
        assert!(matches!(
            svc.validate(&token, now + Duration::minutes(61)),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn altering_any_signature_byte_is_rejected() {
        let svc = service();
        let now = at(1_700_000_000);
        let token = svc.issue(5, "alice", now).unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;

        for i in sig_start..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            let err = svc.validate(&tampered, now).unwrap_err();
            assert!(
                matches!(err, AuthError::SignatureInvalid),
                "byte {i}: unexpected {err:?}"
            );
        }
    }

    #[test]
    fn altered_claims_are_rejected() {
        let svc = service();
        let now = at(1_700_000_000);
        let token = svc.issue(5, "alice", now).unwrap();
        let mallory = svc.issue(6, "mallory", now).unwrap();

        // Splice mallory's claims under alice's signature.
        let alice_parts: Vec<&str> = token.split('.').collect();
        let mallory_parts: Vec<&str> = mallory.split('.').collect();
        let forged = format!("{}.{}.{}", alice_parts[0], mallory_parts[1], alice_parts[2]);

        assert!(matches!(
            svc.validate(&forged, now),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let now = at(1_700_000_000);
        let token = TokenService::with_ttl_hours(b"other-secret", 24)
            .issue(5, "alice", now)
            .unwrap();
        assert!(matches!(
            service().validate(&token, now),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn structurally_malformed_tokens_are_rejected() {
        let svc = service();
        let now = at(1_700_000_000);
        for token in ["", "abc", "a.b", "a.b.c.d", "a..c", ".b.c", "a.b."] {
            let err = svc.validate(token, now).unwrap_err();
            assert!(
                matches!(err, AuthError::Malformed(_)),
                "{token:?}: unexpected {err:?}"
            );
        }
    }

    #[test]
    fn garbage_segments_are_malformed() {
        let err = service()
            .validate("not-base64!.still-not.nope", at(1_700_000_000))
            .unwrap_err();
        assert!(err.is_token_rejection());
    }

    #[test]
    fn claims_expose_timestamps() {
        let svc = service();
        let now = at(1_700_000_000);
        let token = svc.issue(5, "alice", now).unwrap();
        let claims = svc.validate(&token, now).unwrap();
        assert_eq!(claims.issued_at(), Some(now));
        assert_eq!(claims.expires_at(), Some(now + Duration::hours(24)));
    }

    #[test]
    fn secret_is_generated_then_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jwt-secret");

        let first = resolve_jwt_secret_at(&path);
        assert_eq!(first.len(), GENERATED_SECRET_LEN);
        assert!(path.exists());

        let second = resolve_jwt_secret_at(&path);
        assert_eq!(first, second);
    }

    #[test]
    fn existing_secret_file_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jwt-secret");
        std::fs::write(&path, "  persisted-secret\n").unwrap();
        assert_eq!(resolve_jwt_secret_at(&path), "persisted-secret");
    }
}
