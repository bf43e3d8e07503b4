use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Rejected user input. The state that received it is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("{field} must be a number, got \"{value}\"")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} must be greater than zero, got \"{value}\"")]
    OutOfRange { field: &'static str, value: String },

    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("Unknown {field} option: {value}")]
    UnknownOption { field: &'static str, value: String },

    #[error("Invalid email format: {0}")]
    InvalidEmail(String),
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

/// Shape check only; the identity provider has the final say.
pub fn validate_email(email: &str) -> Result<(), InputError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(InputError::Missing { field: "email" });
    }
    if email.len() > 255 || !email_pattern().is_match(email) {
        return Err(InputError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

pub fn require_text(field: &'static str, value: &str) -> Result<(), InputError> {
    if value.trim().is_empty() {
        return Err(InputError::Missing { field });
    }
    Ok(())
}
