//! Rules coupling appointment status to the availability of its slot.
//!
//! The appointment write always happens first; the slot write returned here is
//! applied afterwards, in a separate store call.

use serde::{Deserialize, Serialize};

use crate::contract::model::AppointmentStatus;
use crate::domain::error::DomainError;

/// Slot side effect of an appointment mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotWrite {
    /// Set `is_available = false`.
    MarkBooked,
    /// Set `is_available = true`.
    Release,
}

impl SlotWrite {
    pub fn availability(self) -> bool {
        matches!(self, SlotWrite::Release)
    }
}

pub fn on_booked() -> SlotWrite {
    SlotWrite::MarkBooked
}

pub fn on_deleted() -> SlotWrite {
    SlotWrite::Release
}

/// Cancelled and no-show free the slot; every other target leaves it alone.
///
/// Moving back to `scheduled` does not re-book a released slot.
pub fn on_transition(to: AppointmentStatus) -> Option<SlotWrite> {
    match to {
        AppointmentStatus::Cancelled | AppointmentStatus::NoShow => Some(SlotWrite::Release),
        AppointmentStatus::Scheduled
        | AppointmentStatus::Confirmed
        | AppointmentStatus::Completed => None,
    }
}

/// Which status moves are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Any status may move to any status.
    #[default]
    Permissive,
    /// Only forward moves; cancelled, no-show and completed are terminal.
    Strict,
}

impl TransitionPolicy {
    pub fn allows(self, from: AppointmentStatus, to: AppointmentStatus) -> bool {
        if from == to {
            return true;
        }
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => {
                use AppointmentStatus::*;
                matches!(
                    (from, to),
                    (Scheduled, Confirmed | Cancelled | NoShow | Completed)
                        | (Confirmed, Completed | Cancelled | NoShow)
                )
            }
        }
    }

    pub fn check(self, from: AppointmentStatus, to: AppointmentStatus) -> Result<(), DomainError> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(DomainError::invalid_transition(from, to))
        }
    }
}
