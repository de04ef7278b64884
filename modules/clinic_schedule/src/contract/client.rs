use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::contract::model::{
    Actor, Appointment, AppointmentPatch, AppointmentQuery, AppointmentStatus, DailySchedule,
    NewAppointment, NewSlot, PatientRecord, SlotBatch, SlotConsistency, SlotInterval, SlotPatch,
    SlotQuery, TimeSlot,
};

/// Public API trait for the clinic_schedule module that other modules can use
#[async_trait]
pub trait ClinicScheduleApi: Send + Sync {
    /// Partition a window without persisting anything
    fn preview_slots(&self, start_time: &str, end_time: &str, duration: i64) -> Vec<SlotInterval>;

    /// Partition a window and store one slot per piece
    async fn create_slot_batch(&self, actor: &Actor, batch: SlotBatch)
        -> anyhow::Result<Vec<TimeSlot>>;

    async fn create_slot(&self, actor: &Actor, slot: NewSlot) -> anyhow::Result<TimeSlot>;

    async fn get_slot(&self, id: Uuid) -> anyhow::Result<TimeSlot>;

    async fn list_slots(&self, query: SlotQuery) -> anyhow::Result<Vec<TimeSlot>>;

    async fn update_slot(&self, id: Uuid, patch: SlotPatch) -> anyhow::Result<TimeSlot>;

    async fn set_slot_availability(&self, id: Uuid, is_available: bool)
        -> anyhow::Result<TimeSlot>;

    async fn delete_slot(&self, id: Uuid) -> anyhow::Result<()>;

    /// Book a slot; the slot is marked unavailable after the appointment is stored
    async fn book_appointment(
        &self,
        actor: &Actor,
        new_appointment: NewAppointment,
    ) -> anyhow::Result<Appointment>;

    async fn get_appointment(&self, id: Uuid) -> anyhow::Result<Appointment>;

    async fn list_appointments(&self, query: AppointmentQuery)
        -> anyhow::Result<Vec<Appointment>>;

    async fn update_appointment(
        &self,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> anyhow::Result<Appointment>;

    async fn transition_appointment(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> anyhow::Result<Appointment>;

    async fn delete_appointment(&self, id: Uuid) -> anyhow::Result<()>;

    async fn check_slot_consistency(&self, slot_id: Uuid) -> anyhow::Result<SlotConsistency>;

    async fn reconcile_slot(&self, slot_id: Uuid) -> anyhow::Result<SlotConsistency>;

    async fn daily_schedule(&self, doctor_id: &str, date: NaiveDate)
        -> anyhow::Result<DailySchedule>;

    async fn patient_roster(&self, doctor_id: &str) -> anyhow::Result<Vec<PatientRecord>>;
}
