use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::contract::model::{
    Appointment, AppointmentQuery, AppointmentStatus, SlotPatch, SlotQuery, TimeSlot,
};
use crate::contract::time::WallTime;

/// Slot as handed to the store. Id and timestamps are assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeSlot {
    pub doctor_id: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub start_time: WallTime,
    pub end_time: WallTime,
    pub duration: u32,
    pub is_available: bool,
}

/// Appointment as handed to the store. Id and timestamps are assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointmentRecord {
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
}

/// Field-level update of an appointment row. `None` leaves the column untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppointmentChanges {
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
    pub patient_email: Option<String>,
    pub notes: Option<String>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentChanges {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Port for the domain layer: slot persistence.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait SlotsRepository: Send + Sync {
    /// Insert a slot; the store assigns id and timestamps.
    async fn create(&self, slot: NewTimeSlot) -> anyhow::Result<TimeSlot>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<TimeSlot>>;
    /// Partial update. `Ok(None)` when the slot does not exist.
    async fn update(&self, id: Uuid, patch: SlotPatch) -> anyhow::Result<Option<TimeSlot>>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Equality-filtered listing, unordered.
    async fn find(&self, query: &SlotQuery) -> anyhow::Result<Vec<TimeSlot>>;
}

/// Port for the domain layer: appointment persistence.
#[async_trait]
pub trait AppointmentsRepository: Send + Sync {
    async fn create(&self, appointment: NewAppointmentRecord) -> anyhow::Result<Appointment>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Appointment>>;
    async fn update(
        &self,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> anyhow::Result<Option<Appointment>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn find(&self, query: &AppointmentQuery) -> anyhow::Result<Vec<Appointment>>;
}
