//! Field validation for incoming payloads.
//!
//! Lengths are counted in characters, not bytes.

use thiserror::Error;

use crate::models::blog::ArticlePatch;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 100;
pub const PASSWORD_MIN: usize = 6;
pub const TITLE_MAX: usize = 200;

/// A payload failed a field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

type Result<T = ()> = std::result::Result<T, ValidationError>;

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn require(value: &str, field: &str) -> Result {
    if value.is_empty() {
        return Err(ValidationError(format!("{field} is required")));
    }
    Ok(())
}

fn check_title(title: &str) -> Result {
    require(title, "title")?;
    if char_len(title) > TITLE_MAX {
        return Err(ValidationError(format!(
            "title must be at most {TITLE_MAX} characters"
        )));
    }
    Ok(())
}

/// Registration: username 3–50, valid email, password ≥ 6.
pub fn validate_registration(username: &str, email: &str, password: &str) -> Result {
    let len = char_len(username);
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(ValidationError(format!(
            "username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
        )));
    }
    require(email, "email")?;
    if char_len(email) > EMAIL_MAX || !is_valid_email(email) {
        return Err(ValidationError("email must be a valid email address".into()));
    }
    if char_len(password) < PASSWORD_MIN {
        return Err(ValidationError(format!(
            "password must be at least {PASSWORD_MIN} characters"
        )));
    }
    Ok(())
}

/// Login: both fields required.
pub fn validate_login(username: &str, password: &str) -> Result {
    require(username, "username")?;
    require(password, "password")
}

/// Article creation: title 1–200, content required.
pub fn validate_new_article(title: &str, content: &str) -> Result {
    check_title(title)?;
    require(content, "content")
}

/// Article update: both fields optional. Empty strings count as omitted and
/// are dropped from the returned patch.
pub fn validate_article_patch(
    title: Option<String>,
    content: Option<String>,
) -> Result<ArticlePatch> {
    let title = title.filter(|t| !t.is_empty());
    let content = content.filter(|c| !c.is_empty());
    if let Some(title) = &title {
        check_title(title)?;
    }
    Ok(ArticlePatch { title, content })
}

/// Comment creation: content required.
pub fn validate_new_comment(content: &str) -> Result {
    require(content, "content")
}

/// Syntactic email check: `local@domain.tld`, no whitespace, no empty labels.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}
