//! Authentication module
//!
//! The Issue API accepts a single shared secret carried verbatim in the
//! `Authorization` header.

pub mod middleware;

pub use middleware::{AuthError, AuthState, require_api_key};
