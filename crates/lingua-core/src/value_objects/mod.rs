//! Value objects - immutable types that represent domain concepts

mod role;
mod subject_id;

pub use role::{Role, RoleParseError};
pub use subject_id::{SubjectId, SubjectIdParseError};
