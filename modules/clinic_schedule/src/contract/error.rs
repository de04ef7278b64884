use thiserror::Error;
use uuid::Uuid;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone)]
pub enum ClinicScheduleError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("Slot {id} is not available")]
    Unavailable { id: Uuid },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Some writes of a multi-write operation succeeded and were kept.
    #[error("Partial failure: {message}")]
    PartialFailure { message: String },

    #[error("Internal error")]
    Internal,
}

impl ClinicScheduleError {
    pub fn slot_not_found(id: Uuid) -> Self {
        Self::NotFound { kind: "Slot", id }
    }

    pub fn appointment_not_found(id: Uuid) -> Self {
        Self::NotFound {
            kind: "Appointment",
            id,
        }
    }

    pub fn unavailable(id: Uuid) -> Self {
        Self::Unavailable { id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn partial_failure(message: impl Into<String>) -> Self {
        Self::PartialFailure {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}
