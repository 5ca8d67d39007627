//! Entity to DTO mappers

use lingua_core::Subject;

use super::responses::SubjectResponse;

impl From<&Subject> for SubjectResponse {
    fn from(subject: &Subject) -> Self {
        Self {
            id: subject.id,
            email: subject.email.clone(),
            display_name: subject.display_name.clone(),
            role: subject.role,
            created_at: subject.created_at,
        }
    }
}

impl From<Subject> for SubjectResponse {
    fn from(subject: Subject) -> Self {
        Self::from(&subject)
    }
}
