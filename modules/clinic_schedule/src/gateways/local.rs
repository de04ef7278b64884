use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::contract::{
    client::ClinicScheduleApi,
    error::ClinicScheduleError,
    model::{
        Actor, Appointment, AppointmentPatch, AppointmentQuery, AppointmentStatus, DailySchedule,
        NewAppointment, NewSlot, PatientRecord, SlotBatch, SlotConsistency, SlotInterval,
        SlotPatch, SlotQuery, TimeSlot,
    },
};
use crate::domain::{error::DomainError, service::Service};

/// Local implementation of the ClinicScheduleApi trait that delegates to the domain service
pub struct ClinicScheduleLocalClient {
    service: Arc<Service>,
}

impl ClinicScheduleLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ClinicScheduleApi for ClinicScheduleLocalClient {
    fn preview_slots(&self, start_time: &str, end_time: &str, duration: i64) -> Vec<SlotInterval> {
        self.service.preview_slots(start_time, end_time, duration)
    }

    async fn create_slot_batch(
        &self,
        actor: &Actor,
        batch: SlotBatch,
    ) -> anyhow::Result<Vec<TimeSlot>> {
        self.service
            .create_slot_batch(actor, batch)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn create_slot(&self, actor: &Actor, slot: NewSlot) -> anyhow::Result<TimeSlot> {
        self.service
            .create_slot(actor, slot)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn get_slot(&self, id: Uuid) -> anyhow::Result<TimeSlot> {
        self.service
            .get_slot(id)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn list_slots(&self, query: SlotQuery) -> anyhow::Result<Vec<TimeSlot>> {
        self.service
            .list_slots(query)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn update_slot(&self, id: Uuid, patch: SlotPatch) -> anyhow::Result<TimeSlot> {
        self.service
            .update_slot(id, patch)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn set_slot_availability(
        &self,
        id: Uuid,
        is_available: bool,
    ) -> anyhow::Result<TimeSlot> {
        self.service
            .set_slot_availability(id, is_available)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn delete_slot(&self, id: Uuid) -> anyhow::Result<()> {
        self.service
            .delete_slot(id)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn book_appointment(
        &self,
        actor: &Actor,
        new_appointment: NewAppointment,
    ) -> anyhow::Result<Appointment> {
        self.service
            .book_appointment(actor, new_appointment)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn get_appointment(&self, id: Uuid) -> anyhow::Result<Appointment> {
        self.service
            .get_appointment(id)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn list_appointments(
        &self,
        query: AppointmentQuery,
    ) -> anyhow::Result<Vec<Appointment>> {
        self.service
            .list_appointments(query)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn update_appointment(
        &self,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> anyhow::Result<Appointment> {
        self.service
            .update_appointment(id, patch)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn transition_appointment(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> anyhow::Result<Appointment> {
        self.service
            .transition_appointment(id, status)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn delete_appointment(&self, id: Uuid) -> anyhow::Result<()> {
        self.service
            .delete_appointment(id)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn check_slot_consistency(&self, slot_id: Uuid) -> anyhow::Result<SlotConsistency> {
        self.service
            .check_slot_consistency(slot_id)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn reconcile_slot(&self, slot_id: Uuid) -> anyhow::Result<SlotConsistency> {
        self.service
            .reconcile_slot(slot_id)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn daily_schedule(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<DailySchedule> {
        self.service
            .daily_schedule(doctor_id, date)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn patient_roster(&self, doctor_id: &str) -> anyhow::Result<Vec<PatientRecord>> {
        self.service
            .patient_roster(doctor_id)
            .await
            .map_err(map_domain_error_to_anyhow)
    }
}

/// Map domain errors to contract errors wrapped in anyhow
fn map_domain_error_to_anyhow(domain_error: DomainError) -> anyhow::Error {
    let contract_error = match domain_error {
        DomainError::SlotNotFound { id } => ClinicScheduleError::slot_not_found(id),
        DomainError::AppointmentNotFound { id } => ClinicScheduleError::appointment_not_found(id),
        DomainError::SlotUnavailable { id } => ClinicScheduleError::unavailable(id),
        e @ (DomainError::InvalidTimeWindow { .. }
        | DomainError::EmptyPartition { .. }
        | DomainError::TooManySlots { .. }
        | DomainError::Validation { .. }
        | DomainError::InvalidTransition { .. }) => ClinicScheduleError::validation(e.to_string()),
        e @ (DomainError::BatchIncomplete { .. } | DomainError::PartialWrite { .. }) => {
            ClinicScheduleError::partial_failure(e.to_string())
        }
        DomainError::Database { .. } => ClinicScheduleError::internal(),
    };

    anyhow::Error::new(contract_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_contract_kinds() {
        let id = Uuid::new_v4();

        let err = map_domain_error_to_anyhow(DomainError::slot_unavailable(id));
        assert!(matches!(
            err.downcast_ref::<ClinicScheduleError>(),
            Some(ClinicScheduleError::Unavailable { id: got }) if *got == id
        ));

        let err = map_domain_error_to_anyhow(DomainError::partial_write(id, id, "boom"));
        assert!(matches!(
            err.downcast_ref::<ClinicScheduleError>(),
            Some(ClinicScheduleError::PartialFailure { .. })
        ));

        let err = map_domain_error_to_anyhow(DomainError::database("secret dsn"));
        let contract = err.downcast_ref::<ClinicScheduleError>().unwrap();
        assert!(matches!(contract, ClinicScheduleError::Internal));
        assert!(!contract.to_string().contains("secret"));
    }
}
