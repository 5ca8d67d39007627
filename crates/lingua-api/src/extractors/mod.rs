//! Axum extractors for request handling
//!
//! Bearer authentication and validated JSON bodies.

mod auth;
mod validated;

pub use auth::AuthSubject;
pub use validated::ValidatedJson;
