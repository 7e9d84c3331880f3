//! Client-side input checks, applied before any request is issued.

use crate::error::{AppError, Result};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_TEXT_LEN: usize = 2000;

/// Trims `value` and checks it is non-empty and at most `max` characters.
pub fn required(field: &str, value: &str, max: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty.")));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::Validation(format!("{field} must be at most {max} characters.")));
    }
    Ok(trimmed.to_string())
}

pub fn title(value: &str) -> Result<String> {
    required("Title", value, MAX_TITLE_LEN)
}

pub fn thread_text(value: &str) -> Result<String> {
    required("Thread text", value, MAX_TEXT_LEN)
}

pub fn reply_text(value: &str) -> Result<String> {
    required("Reply text", value, MAX_TEXT_LEN)
}

/// Username and password must be present; the password is returned as typed.
pub fn credentials<'a>(username: &str, password: &'a str) -> Result<(String, &'a str)> {
    let username = username.trim();
    if username.is_empty() || password.trim().is_empty() {
        return Err(AppError::Validation("Username and password are required.".to_string()));
    }
    Ok((username.to_string(), password))
}
