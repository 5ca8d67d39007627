//! Business logic services

pub mod auth;
pub mod authority;
pub mod context;
pub mod error;
pub mod pruning;

pub use auth::AuthService;
pub use authority::CredentialAuthority;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use pruning::spawn_pruning_job;
