use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::AppointmentStatus;

/// Transport-agnostic domain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleEvent {
    SlotsCreated {
        ids: Vec<Uuid>,
        at: DateTime<Utc>,
    },
    SlotUpdated {
        id: Uuid,
        is_available: bool,
        at: DateTime<Utc>,
    },
    SlotDeleted {
        id: Uuid,
        at: DateTime<Utc>,
    },
    AppointmentBooked {
        id: Uuid,
        slot_id: Uuid,
        at: DateTime<Utc>,
    },
    AppointmentUpdated {
        id: Uuid,
        at: DateTime<Utc>,
    },
    AppointmentStatusChanged {
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
        at: DateTime<Utc>,
    },
    AppointmentDeleted {
        id: Uuid,
        slot_id: Uuid,
        at: DateTime<Utc>,
    },
    SlotReconciled {
        id: Uuid,
        is_available: bool,
        at: DateTime<Utc>,
    },
}
