//! User Registry for the Padron Service
//!
//! This crate holds the in-memory user collection behind the HTTP API:
//! sequential id assignment, request payload validation with the API's
//! Spanish messages, and email uniqueness at registration time. The HTTP
//! layer lives in `padron-rpc`; nothing in here knows about routes or
//! status codes.

pub mod registry;
pub mod types;
pub mod validation;
pub mod errors;

pub use registry::UserRegistry;
pub use types::*;
pub use validation::*;
pub use errors::*;
