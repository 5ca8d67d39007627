//! Domain entities - core business objects

mod credential;
mod revocation;
mod subject;

pub use credential::CredentialPair;
pub use revocation::{RevocationEntry, RevocationReason};
pub use subject::Subject;
