//! Field validators shared by the request DTOs.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

pub const MAX_EMAIL_LENGTH: usize = 254;

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Invalid email regex")
    })
}

fn phone_regex() -> &'static Regex {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    PHONE_REGEX.get_or_init(|| {
        Regex::new(r"^\+?[0-9][0-9\s\-().]{5,19}$")
            .expect("Invalid phone regex")
    })
}

fn username_regex() -> &'static Regex {
    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_.\-]{3,50}$")
            .expect("Invalid username regex")
    })
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LENGTH && email_regex().is_match(email)
}

/// Lowercases and trims; emails are compared in this form everywhere.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn email_validator(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(email.trim()) {
        Ok(())
    } else {
        Err(invalid("email", "must be a valid email address"))
    }
}

pub fn phone_validator(phone: &str) -> Result<(), ValidationError> {
    if phone_regex().is_match(phone.trim()) {
        Ok(())
    } else {
        Err(invalid("phone", "must be a valid phone number"))
    }
}

pub fn username_validator(username: &str) -> Result<(), ValidationError> {
    if username_regex().is_match(username) {
        Ok(())
    } else {
        Err(invalid(
            "username",
            "must be 3-50 characters of letters, digits, '.', '_' or '-'",
        ))
    }
}

/// Length is checked separately; this covers character classes.
pub fn password_validator(password: &str) -> Result<(), ValidationError> {
    if !password.chars().any(char::is_uppercase) {
        return Err(invalid(
            "password_uppercase",
            "must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(invalid(
            "password_lowercase",
            "must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid("password_digit", "must contain at least one digit"));
    }
    Ok(())
}

/// Flattens validator output into `field: message; field: message`.
#[must_use]
pub fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .errors()
        .iter()
        .flat_map(|(field, kind)| match kind {
            ValidationErrorsKind::Field(errs) => errs
                .iter()
                .map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map_or_else(|| e.code.to_string(), ToString::to_string);
                    format!("{field}: {message}")
                })
                .collect::<Vec<_>>(),
            ValidationErrorsKind::Struct(inner) => vec![format!("{field}: {}", describe(inner))],
            ValidationErrorsKind::List(_) => vec![format!("{field}: invalid")],
        })
        .collect();

    parts.sort();
    parts.join("; ")
}
