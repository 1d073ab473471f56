use crate::types::DbId;
use crate::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A backing store or blob store operation failed.
    ///
    /// `transient` marks faults worth retrying (timeouts, dropped
    /// connections, serialization failures, throttling).
    #[error("Storage error: {message}")]
    Storage { message: String, transient: bool },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// A storage failure that will not go away on retry.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            transient: false,
        }
    }

    /// A storage failure that may succeed if attempted again.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            transient: true,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage { transient: true, .. })
    }
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_storage_errors_are_transient() {
        assert!(CoreError::transient("pool timed out").is_transient());
        assert!(!CoreError::storage("disk full").is_transient());
        assert!(!CoreError::Conflict("dup".into()).is_transient());
        assert!(!CoreError::NotFound {
            entity: "Movie",
            id: 1
        }
        .is_transient());
    }

    #[test]
    fn display_includes_entity_and_id() {
        let err = CoreError::NotFound {
            entity: "Genre",
            id: 42,
        };
        assert_eq!(err.to_string(), "Entity not found: Genre with id 42");
    }
}
