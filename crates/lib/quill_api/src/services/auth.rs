//! Authentication service: register/login flows delegating to `quill_core::auth`.

use chrono::Utc;
use quill_core::auth::jwt::TokenService;
use quill_core::auth::password;
use quill_core::models::auth::NewUser;
use quill_core::store::BlogStore;
use quill_core::validation;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{LoginResponse, RegisterResponse};

/// Generic login failure; never reveals whether the username exists.
fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".into())
}

/// Register a new user account.
///
/// Username and email uniqueness is checked before insert; the store's unique
/// constraints catch the race between two concurrent registrations.
pub async fn register(
    store: &dyn BlogStore,
    username: &str,
    email: &str,
    password: &str,
    bcrypt_cost: u32,
) -> AppResult<RegisterResponse> {
    validation::validate_registration(username, email, password)?;

    if store.username_exists(username).await? {
        return Err(AppError::Validation("Username already exists".into()));
    }
    if store.email_exists(email).await? {
        return Err(AppError::Validation("Email already exists".into()));
    }

    let password_hash = password::hash_password_with_cost(password, bcrypt_cost)?;

    let user = store
        .create_user(NewUser {
            username,
            email,
            password_hash: &password_hash,
        })
        .await?;

    info!(user_id = user.id, username, "user registered");

    Ok(RegisterResponse {
        message: "User registered successfully".into(),
        user: user.into(),
    })
}

/// Authenticate with username + password and issue an access token.
pub async fn login(
    store: &dyn BlogStore,
    tokens: &TokenService,
    username: &str,
    password: &str,
) -> AppResult<LoginResponse> {
    validation::validate_login(username, password)?;

    let Some(found) = store.find_user_by_username(username).await? else {
        return Err(invalid_credentials());
    };

    if !password::verify_password(password, &found.password_hash)? {
        return Err(invalid_credentials());
    }

    let token = tokens.issue(found.user.id, &found.user.username, Utc::now())?;

    info!(user_id = found.user.id, "login successful");

    Ok(LoginResponse {
        message: "Login successful".into(),
        token,
        user: found.user.into(),
    })
}
