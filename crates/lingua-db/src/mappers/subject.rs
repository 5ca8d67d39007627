//! Subject entity <-> model mapper

use lingua_core::{DomainError, Role, Subject, SubjectId};

use crate::models::SubjectModel;

impl TryFrom<SubjectModel> for Subject {
    type Error = DomainError;

    fn try_from(model: SubjectModel) -> Result<Self, Self::Error> {
        let role = model
            .role
            .parse::<Role>()
            .map_err(|e| DomainError::UnknownRole(e.0))?;

        Ok(Subject {
            id: SubjectId::new(model.id),
            email: model.email,
            display_name: model.display_name,
            role,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
