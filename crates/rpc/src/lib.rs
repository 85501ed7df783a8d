//! HTTP API for the Padron user registry
//!
//! Exposes the Spanish-language `/usuarios` CRUD surface over a shared
//! [`padron_registry::UserRegistry`], plus a health endpoint and an HTML
//! index page. Routing, status codes and response bodies live here; the
//! storage rules live in `padron-registry`.

pub mod server;

mod server_tests;

pub use server::{build_router, start_server, AppState};
