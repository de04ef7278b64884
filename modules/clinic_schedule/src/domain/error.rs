use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::AppointmentStatus;
use crate::domain::partition::PartitionError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Slot not found: {id}")]
    SlotNotFound { id: Uuid },

    #[error("Appointment not found: {id}")]
    AppointmentNotFound { id: Uuid },

    #[error("Slot {id} is already booked")]
    SlotUnavailable { id: Uuid },

    #[error("Invalid time window: {source}")]
    InvalidTimeWindow {
        #[from]
        source: PartitionError,
    },

    #[error("Window {start}-{end} cannot fit a single {duration} minute slot")]
    EmptyPartition {
        start: String,
        end: String,
        duration: i64,
    },

    #[error("Window yields {count} slots (max: {max})")]
    TooManySlots { count: usize, max: usize },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Cannot move appointment from '{from}' to '{to}'")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Batch incomplete: {created} slots created, {failed} failed: {first_error}")]
    BatchIncomplete {
        created: usize,
        failed: usize,
        first_error: String,
    },

    #[error("Appointment {appointment_id} was written but slot {slot_id} was not: {message}")]
    PartialWrite {
        appointment_id: Uuid,
        slot_id: Uuid,
        message: String,
    },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn slot_not_found(id: Uuid) -> Self {
        Self::SlotNotFound { id }
    }

    pub fn appointment_not_found(id: Uuid) -> Self {
        Self::AppointmentNotFound { id }
    }

    pub fn slot_unavailable(id: Uuid) -> Self {
        Self::SlotUnavailable { id }
    }

    pub fn empty_partition(start: impl Into<String>, end: impl Into<String>, duration: i64) -> Self {
        Self::EmptyPartition {
            start: start.into(),
            end: end.into(),
            duration,
        }
    }

    pub fn too_many_slots(count: usize, max: usize) -> Self {
        Self::TooManySlots { count, max }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_transition(from: AppointmentStatus, to: AppointmentStatus) -> Self {
        Self::InvalidTransition { from, to }
    }

    pub fn batch_incomplete(created: usize, failed: usize, first_error: impl Into<String>) -> Self {
        Self::BatchIncomplete {
            created,
            failed,
            first_error: first_error.into(),
        }
    }

    pub fn partial_write(appointment_id: Uuid, slot_id: Uuid, message: impl Into<String>) -> Self {
        Self::PartialWrite {
            appointment_id,
            slot_id,
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
