//! Data transfer objects for API requests and responses
//!
//! Credential-bearing responses use `lingua_core::CredentialPair` directly so
//! the server and the client share one wire format.

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{LoginRequest, LogoutRequest, RefreshTokenRequest, RegisterRequest};
pub use responses::{HealthChecks, HealthResponse, ReadinessResponse, SubjectResponse};
