//! Repository implementations
//!
//! PostgreSQL implementations of the ports defined in lingua-core.

mod error;
mod revocation;
mod subject;

pub use revocation::PgRevocationRegistry;
pub use subject::PgSubjectRepository;
