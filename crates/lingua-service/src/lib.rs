//! # lingua-service
//!
//! Application layer: the credential authority, the auth flows built on it,
//! the pruning job, and the DTOs the API layer serializes.

pub mod dto;
pub mod services;

pub use dto::{
    HealthChecks, HealthResponse, LoginRequest, LogoutRequest, ReadinessResponse,
    RefreshTokenRequest, RegisterRequest, SubjectResponse,
};
pub use services::{
    spawn_pruning_job, AuthService, CredentialAuthority, ServiceContext, ServiceContextBuilder,
    ServiceError, ServiceResult,
};
