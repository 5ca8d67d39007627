//! # lingua-core
//!
//! Domain layer containing subjects, credential pairs, revocation entries and the
//! ports (repository and registry traits) the infrastructure crates implement.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{CredentialPair, RevocationEntry, RevocationReason, Subject};
pub use error::DomainError;
pub use traits::{RepoResult, RevocationRegistry, SubjectRepository};
pub use value_objects::{Role, RoleParseError, SubjectId, SubjectIdParseError};
