//! Client for the hosted backend supplying row storage and authentication.
//!
//! The rest of the workspace talks to the backend only through the
//! `RowStore` and `AuthApi` traits. `HttpBackend` implements both against
//! the hosted REST/auth endpoints; `MemoryBackend` is the in-memory stand-in
//! used by tests and doc examples.

pub mod api;
pub mod errors;
pub mod http;
pub mod memory;

pub use api::{AuthApi, AuthEvent, BackendSession, BackendUser, RowStore};
pub use errors::BackendError;
pub use http::HttpBackend;
pub use memory::MemoryBackend;
