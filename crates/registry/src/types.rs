//! Types for the user registry

use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Auto-assigned identifier, unique for the lifetime of the registry
    pub id: u64,
    /// Display name, never empty
    pub name: String,
    /// Contact email, unique at registration time
    pub email: String,
    /// Age in years; omitted from responses when the user never supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

/// Registration payload
///
/// Every field is optional at the type level so that a missing key in the
/// request body reaches validation instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<u32>,
}

/// Partial update payload; absent fields leave the stored value unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<u32>,
}
