use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Drink {id} not found")]
    NotFound { id: i64 },

    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("A drink titled '{title}' already exists")]
    Conflict { title: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    #[must_use]
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(title: impl Into<String>) -> Self {
        Self::Conflict {
            title: title.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
