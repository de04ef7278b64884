use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::contract::time::WallTime;

// Pure models for inter-module communication (no serde). REST DTOs live in api::rest::dto.

/// Authenticated actor as supplied by the identity provider. Opaque to this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub doctor_id: String,
    pub doctor_name: String,
}

/// One `[start, end)` piece of a partitioned window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotInterval {
    pub start: WallTime,
    pub end: WallTime,
}

impl SlotInterval {
    pub fn length_minutes(&self) -> i64 {
        self.start.minutes_until(self.end)
    }
}

/// A bookable unit of a doctor's calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub id: Uuid,
    pub doctor_id: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub start_time: WallTime,
    pub end_time: WallTime,
    /// Stored independently of the times; manual edits may let it drift.
    pub duration: u32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Window to partition into equal slots. Times arrive as typed and are
/// validated by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBatch {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub duration: i64,
}

/// A single slot with an explicit duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlot {
    pub date: NaiveDate,
    pub start_time: WallTime,
    pub end_time: WallTime,
    pub duration: u32,
}

/// Partial update for a slot. `None` leaves the field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlotPatch {
    pub date: Option<NaiveDate>,
    pub start_time: Option<WallTime>,
    pub end_time: Option<WallTime>,
    pub duration: Option<u32>,
    pub is_available: Option<bool>,
}

impl SlotPatch {
    pub fn availability(is_available: bool) -> Self {
        Self {
            is_available: Some(is_available),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Equality filters over the slot collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotQuery {
    ByDoctor(String),
    ByDate(NaiveDate),
    Available { date: Option<NaiveDate> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
        }
    }

    /// Whether an appointment in this status keeps its slot booked.
    pub fn holds_slot(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Scheduled
                | AppointmentStatus::Confirmed
                | AppointmentStatus::Completed
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown appointment status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A patient's booking against exactly one slot.
///
/// `date`, `start_time`, `end_time` and `doctor_name` are copies taken at
/// booking time and do not follow later edits of the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub date: NaiveDate,
    pub start_time: WallTime,
    pub end_time: WallTime,
    pub doctor_id: String,
    pub doctor_name: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub slot_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub notes: Option<String>,
}

/// Partial update of the patient-facing fields of an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppointmentPatch {
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
    pub patient_email: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentQuery {
    All,
    ByDoctor(String),
    ByDate(NaiveDate),
    ByStatus(AppointmentStatus),
    BySlot(Uuid),
}

/// Result of comparing a slot's availability flag with the appointments referencing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotConsistency {
    pub slot_id: Uuid,
    pub is_available: bool,
    /// Appointments whose status still holds the slot.
    pub holding: Vec<Uuid>,
    pub appointment_count: usize,
    /// `None` when no appointment was ever booked against the slot.
    pub expected_available: Option<bool>,
}

impl SlotConsistency {
    pub fn is_consistent(&self) -> bool {
        self.expected_available
            .map_or(true, |expected| expected == self.is_available)
    }

    pub fn is_double_booked(&self) -> bool {
        self.holding.len() > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub total: usize,
    pub scheduled: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub no_show: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: AppointmentStatus) {
        self.total += 1;
        match status {
            AppointmentStatus::Scheduled => self.scheduled += 1,
            AppointmentStatus::Confirmed => self.confirmed += 1,
            AppointmentStatus::Completed => self.completed += 1,
            AppointmentStatus::Cancelled => self.cancelled += 1,
            AppointmentStatus::NoShow => self.no_show += 1,
        }
    }
}

/// One doctor's appointments on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub appointments: Vec<Appointment>,
    pub counts: StatusCounts,
}

/// Appointments of one patient, identified by normalised phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientRecord {
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub appointments: Vec<Appointment>,
    pub last_appointment_date: NaiveDate,
    pub last_appointment_time: WallTime,
}
