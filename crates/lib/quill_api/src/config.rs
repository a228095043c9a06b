//! API server configuration.

use quill_core::auth::jwt::DEFAULT_TTL_HOURS;

/// Configuration for the API server.
///
/// Built once at startup by the server binary from its command line and
/// environment.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Access token lifetime in hours.
    pub jwt_ttl_hours: i64,
    /// bcrypt cost used when hashing new passwords.
    pub bcrypt_cost: u32,
}

impl ApiConfig {
    /// Configuration suitable for tests: fixed secret, cheap hashing.
    pub fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            database_url: String::new(),
            jwt_secret: "test-secret".into(),
            jwt_ttl_hours: DEFAULT_TTL_HOURS,
            bcrypt_cost: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_uses_cheap_hashing() {
        let config = ApiConfig::for_tests();
        assert_eq!(config.bcrypt_cost, 4);
        assert_eq!(config.jwt_ttl_hours, 24);
    }
}
