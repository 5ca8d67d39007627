//! Database models - SQLx-compatible structs for PostgreSQL tables

mod subject;

pub use subject::SubjectModel;
