//! Error types for the user registry
//!
//! The message constants are the exact strings the HTTP layer returns to
//! clients, so they stay in Spanish.

use crate::validation::FieldError;
use thiserror::Error;

/// Body message for a user id that does not resolve
pub const USER_NOT_FOUND: &str = "Usuario no encontrado";

/// Body message for a registration whose email is already stored
pub const EMAIL_IN_USE: &str = "El correo ingresado ya está en uso";

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{}", USER_NOT_FOUND)]
    UserNotFound { id: u64 },

    #[error("{}", EMAIL_IN_USE)]
    EmailAlreadyInUse { email: String },

    #[error("Validation failed for {} field(s)", .errors.len())]
    ValidationFailed { errors: Vec<FieldError> },
}

pub type Result<T> = std::result::Result<T, RegistryError>;
