//! Credimo API — the HTTP surface of the back-office.
//!
//! Routes live under `/api`; every error body is `{"detail": ...}`
//! with a pt-PT message. Authentication is a bearer token resolved by
//! the [`extract::Auth`] extractor; row visibility and capabilities
//! come from `credimo_core::policy`, never from ad-hoc role checks in
//! handlers.

pub mod error;
pub mod extract;
pub mod notify;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use server::{create_router, serve};
pub use state::{ApiConfig, AppState, SmtpConfig};
