//! Shared validation helpers applied before any store access.
//!
//! The input structs themselves carry `validator` derives; this module holds
//! the pieces those derives reference (the username regex, the update-title
//! rule) and the conversion from a `ValidationErrors` set to the single
//! first-failing-field message the API returns.

use lazy_static::lazy_static;
use regex::Regex;
use validator::{ValidationError, ValidationErrors};

lazy_static! {
    /// Usernames are strictly alphanumeric; length is enforced separately.
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9]+$").unwrap();
}

/// Flattens a `ValidationErrors` set into one human-readable message naming
/// the first failing field. Only the first violation is reported; the client
/// fixes fields one at a time.
pub fn first_validation_message(errors: &ValidationErrors) -> String {
    for (field, field_errors) in errors.field_errors() {
        if let Some(error) = field_errors.first() {
            return match &error.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: invalid value ({})", field, error.code),
            };
        }
    }
    "Invalid input".to_string()
}

/// Title rule for task updates: an empty string means "keep the stored
/// title" and passes; a non-empty title must satisfy the same 3-200 bounds
/// as on creation.
pub fn validate_update_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Ok(());
    }
    let len = title.chars().count();
    if !(3..=200).contains(&len) {
        let mut error = ValidationError::new("length");
        error.message = Some("title must be between 3 and 200 characters".into());
        return Err(error);
    }
    Ok(())
}
