//! Request payload validation
//!
//! Checks run in a fixed field order (name, then email) so response
//! bodies are deterministic, and every failing field is reported in the
//! same response. Messages are the user-facing Spanish strings the API
//! returns inside `errores` bodies.

use crate::types::{NewUser, UserUpdate};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

/// Message returned when `name` is missing or empty
pub const NAME_REQUIRED: &str = "Nombre de usuario obligatorio";

/// Message returned when `email` is missing or fails the syntax check
pub const EMAIL_INVALID: &str = "Por favor, ingrese un correo electrónico válido";

/// A single failed check, tied to the request field that caused it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Request field the check applies to (`name` or `email`)
    pub field: String,
    /// User-facing message in the API's Spanish wording
    pub message: String,
}

impl FieldError {
    pub fn name_required() -> Self {
        Self {
            field: "name".to_string(),
            message: NAME_REQUIRED.to_string(),
        }
    }

    pub fn email_invalid() -> Self {
        Self {
            field: "email".to_string(),
            message: EMAIL_INVALID.to_string(),
        }
    }
}

/// Validate a registration payload
///
/// Both fields are required: a missing `name` reports the same message as
/// an empty one, and a missing `email` the same message as a malformed one.
pub fn validate_new_user(new_user: &NewUser) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if !new_user.name.as_deref().is_some_and(|name| !name.is_empty()) {
        errors.push(FieldError::name_required());
    }
    if !new_user
        .email
        .as_deref()
        .is_some_and(|email| email.validate_email())
    {
        errors.push(FieldError::email_invalid());
    }

    errors
}

/// Validate an update payload
///
/// Absent fields are fine; present fields are held to the same checks as
/// a registration.
pub fn validate_user_update(update: &UserUpdate) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if update.name.as_deref().is_some_and(|name| name.is_empty()) {
        errors.push(FieldError::name_required());
    }
    if update
        .email
        .as_deref()
        .is_some_and(|email| !email.validate_email())
    {
        errors.push(FieldError::email_invalid());
    }

    errors
}
