use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    Actor, Appointment, AppointmentPatch, AppointmentQuery, AppointmentStatus, DailySchedule,
    NewAppointment, NewSlot, PatientRecord, SlotBatch, SlotConsistency, SlotInterval, SlotPatch,
    SlotQuery, TimeSlot,
};
use crate::domain::error::DomainError;
use crate::domain::events::ScheduleEvent;
use crate::domain::lifecycle::{self, SlotWrite, TransitionPolicy};
use crate::domain::ordering::{sort_appointments, sort_slots};
use crate::domain::partition::{self, PartitionError};
use crate::domain::ports::EventPublisher;
use crate::domain::reports;
use crate::domain::repo::{
    AppointmentChanges, AppointmentsRepository, NewAppointmentRecord, NewTimeSlot,
    SlotsRepository,
};

/// Domain service for slots and appointments.
/// Depends only on the repository ports, not on infra types.
///
/// Appointment and slot writes are two separate store calls with no
/// transaction around them: the appointment is written first, the slot second.
#[derive(Clone)]
pub struct Service {
    slots: Arc<dyn SlotsRepository>,
    appointments: Arc<dyn AppointmentsRepository>,
    events: Arc<dyn EventPublisher<ScheduleEvent>>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_slots_per_batch: usize,
    pub max_patient_name_length: usize,
    pub transition_policy: TransitionPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_slots_per_batch: 96,
            max_patient_name_length: 100,
            transition_policy: TransitionPolicy::Permissive,
        }
    }
}

fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

impl Service {
    pub fn new(
        slots: Arc<dyn SlotsRepository>,
        appointments: Arc<dyn AppointmentsRepository>,
        events: Arc<dyn EventPublisher<ScheduleEvent>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            slots,
            appointments,
            events,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // --- slots ---

    #[instrument(name = "clinic_schedule.service.preview_slots", skip(self))]
    pub fn preview_slots(&self, start_time: &str, end_time: &str, duration: i64) -> Vec<SlotInterval> {
        let slots = partition::partition(start_time, end_time, duration);
        debug!(count = slots.len(), "Previewed slots");
        slots
    }

    #[instrument(
        name = "clinic_schedule.service.create_slot_batch",
        skip(self, actor),
        fields(doctor_id = %actor.doctor_id, date = %batch.date)
    )]
    pub async fn create_slot_batch(
        &self,
        actor: &Actor,
        batch: SlotBatch,
    ) -> Result<Vec<TimeSlot>, DomainError> {
        info!("Creating slot batch");

        self.validate_actor(actor)?;
        partition::validate_window(&batch.start_time, &batch.end_time, batch.duration)?;

        let candidates = partition::build_candidates(&batch, actor);
        if candidates.is_empty() {
            return Err(DomainError::empty_partition(
                batch.start_time,
                batch.end_time,
                batch.duration,
            ));
        }
        if candidates.len() > self.config.max_slots_per_batch {
            return Err(DomainError::too_many_slots(
                candidates.len(),
                self.config.max_slots_per_batch,
            ));
        }

        // Fire every insert, then wait for all of them. Successful inserts are kept
        // even when siblings fail.
        let results = join_all(candidates.into_iter().map(|c| self.slots.create(c))).await;

        let mut created = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for r in results {
            match r {
                Ok(slot) => created.push(slot),
                Err(e) => failures.push(e),
            }
        }

        if !created.is_empty() {
            self.events.publish(&ScheduleEvent::SlotsCreated {
                ids: created.iter().map(|s| s.id).collect(),
                at: Utc::now(),
            });
        }

        if let Some(first) = failures.first() {
            warn!(
                created = created.len(),
                failed = failures.len(),
                "Slot batch partially failed: {first:#}"
            );
            return Err(DomainError::batch_incomplete(
                created.len(),
                failures.len(),
                format!("{first:#}"),
            ));
        }

        sort_slots(&mut created);
        info!("Successfully created {} slots", created.len());
        Ok(created)
    }

    #[instrument(
        name = "clinic_schedule.service.create_slot",
        skip(self, actor),
        fields(doctor_id = %actor.doctor_id, date = %slot.date)
    )]
    pub async fn create_slot(&self, actor: &Actor, slot: NewSlot) -> Result<TimeSlot, DomainError> {
        info!("Creating single slot");

        self.validate_actor(actor)?;
        if slot.start_time >= slot.end_time {
            return Err(PartitionError::EmptyRange {
                start: slot.start_time,
                end: slot.end_time,
            }
            .into());
        }
        if slot.duration == 0 {
            return Err(DomainError::validation("duration", "must be positive"));
        }

        let created = self
            .slots
            .create(NewTimeSlot {
                doctor_id: actor.doctor_id.clone(),
                doctor_name: actor.doctor_name.clone(),
                date: slot.date,
                start_time: slot.start_time,
                end_time: slot.end_time,
                duration: slot.duration,
                is_available: true,
            })
            .await
            .map_err(db_err)?;

        self.events.publish(&ScheduleEvent::SlotsCreated {
            ids: vec![created.id],
            at: created.created_at,
        });

        info!("Successfully created slot with id={}", created.id);
        Ok(created)
    }

    #[instrument(name = "clinic_schedule.service.get_slot", skip(self), fields(slot_id = %id))]
    pub async fn get_slot(&self, id: Uuid) -> Result<TimeSlot, DomainError> {
        debug!("Getting slot by id");
        self.slots
            .find_by_id(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::slot_not_found(id))
    }

    #[instrument(name = "clinic_schedule.service.list_slots", skip(self))]
    pub async fn list_slots(&self, query: SlotQuery) -> Result<Vec<TimeSlot>, DomainError> {
        debug!("Listing slots");
        let mut slots = self.slots.find(&query).await.map_err(db_err)?;
        sort_slots(&mut slots);
        debug!("Successfully listed {} slots", slots.len());
        Ok(slots)
    }

    /// Partial update. The stored `duration` is not reconciled with the times.
    ///
    /// When the patch moves either bound, the resulting window (patched bound
    /// plus the stored other bound) must still have start before end.
    #[instrument(name = "clinic_schedule.service.update_slot", skip(self), fields(slot_id = %id))]
    pub async fn update_slot(&self, id: Uuid, patch: SlotPatch) -> Result<TimeSlot, DomainError> {
        info!("Updating slot");

        if patch.duration == Some(0) {
            return Err(DomainError::validation("duration", "must be positive"));
        }
        if patch.start_time.is_some() || patch.end_time.is_some() {
            let (start, end) = match (patch.start_time, patch.end_time) {
                (Some(start), Some(end)) => (start, end),
                (start, end) => {
                    let current = self.get_slot(id).await?;
                    (
                        start.unwrap_or(current.start_time),
                        end.unwrap_or(current.end_time),
                    )
                }
            };
            if start >= end {
                return Err(PartitionError::EmptyRange { start, end }.into());
            }
        }

        let updated = self
            .slots
            .update(id, patch)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::slot_not_found(id))?;

        self.events.publish(&ScheduleEvent::SlotUpdated {
            id,
            is_available: updated.is_available,
            at: updated.updated_at,
        });

        info!("Successfully updated slot");
        Ok(updated)
    }

    #[instrument(
        name = "clinic_schedule.service.set_slot_availability",
        skip(self),
        fields(slot_id = %id)
    )]
    pub async fn set_slot_availability(
        &self,
        id: Uuid,
        is_available: bool,
    ) -> Result<TimeSlot, DomainError> {
        self.update_slot(id, SlotPatch::availability(is_available))
            .await
    }

    #[instrument(name = "clinic_schedule.service.delete_slot", skip(self), fields(slot_id = %id))]
    pub async fn delete_slot(&self, id: Uuid) -> Result<(), DomainError> {
        info!("Deleting slot");

        let deleted = self.slots.delete(id).await.map_err(db_err)?;
        if !deleted {
            return Err(DomainError::slot_not_found(id));
        }

        self.events
            .publish(&ScheduleEvent::SlotDeleted { id, at: Utc::now() });

        info!("Successfully deleted slot");
        Ok(())
    }

    // --- appointments ---

    /// Book an available slot.
    ///
    /// Two bookings racing for the same slot can both succeed.
    #[instrument(
        name = "clinic_schedule.service.book_appointment",
        skip(self, actor, new_appointment),
        fields(doctor_id = %actor.doctor_id, slot_id = %new_appointment.slot_id)
    )]
    pub async fn book_appointment(
        &self,
        actor: &Actor,
        new_appointment: NewAppointment,
    ) -> Result<Appointment, DomainError> {
        info!("Booking appointment");

        self.validate_actor(actor)?;
        self.validate_patient_name(&new_appointment.patient_name)?;
        self.validate_patient_phone(&new_appointment.patient_phone)?;

        let slot_id = new_appointment.slot_id;
        let slot = self.get_slot(slot_id).await?;
        if !slot.is_available {
            return Err(DomainError::slot_unavailable(slot_id));
        }

        let appointment = self
            .appointments
            .create(NewAppointmentRecord {
                slot_id,
                patient_name: new_appointment.patient_name.trim().to_string(),
                patient_phone: new_appointment.patient_phone.trim().to_string(),
                patient_email: non_blank(new_appointment.patient_email),
                date: slot.date,
                start_time: slot.start_time,
                end_time: slot.end_time,
                doctor_id: actor.doctor_id.clone(),
                doctor_name: slot.doctor_name,
                status: AppointmentStatus::Scheduled,
                notes: non_blank(new_appointment.notes),
            })
            .await
            .map_err(db_err)?;

        self.events.publish(&ScheduleEvent::AppointmentBooked {
            id: appointment.id,
            slot_id,
            at: appointment.created_at,
        });

        self.apply_slot_write(appointment.id, slot_id, lifecycle::on_booked())
            .await?;

        info!("Successfully booked appointment with id={}", appointment.id);
        Ok(appointment)
    }

    #[instrument(
        name = "clinic_schedule.service.get_appointment",
        skip(self),
        fields(appointment_id = %id)
    )]
    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, DomainError> {
        debug!("Getting appointment by id");
        self.appointments
            .find_by_id(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::appointment_not_found(id))
    }

    #[instrument(name = "clinic_schedule.service.list_appointments", skip(self))]
    pub async fn list_appointments(
        &self,
        query: AppointmentQuery,
    ) -> Result<Vec<Appointment>, DomainError> {
        debug!("Listing appointments");
        let mut appointments = self.appointments.find(&query).await.map_err(db_err)?;
        sort_appointments(&mut appointments);
        debug!("Successfully listed {} appointments", appointments.len());
        Ok(appointments)
    }

    /// Edit patient details and notes. Status has its own operation.
    #[instrument(
        name = "clinic_schedule.service.update_appointment",
        skip(self, patch),
        fields(appointment_id = %id)
    )]
    pub async fn update_appointment(
        &self,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, DomainError> {
        info!("Updating appointment");

        if let Some(ref name) = patch.patient_name {
            self.validate_patient_name(name)?;
        }
        if let Some(ref phone) = patch.patient_phone {
            self.validate_patient_phone(phone)?;
        }

        let changes = AppointmentChanges {
            patient_name: patch.patient_name.map(|n| n.trim().to_string()),
            patient_phone: patch.patient_phone.map(|p| p.trim().to_string()),
            patient_email: patch.patient_email,
            notes: patch.notes,
            status: None,
        };

        let updated = self
            .appointments
            .update(id, changes)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::appointment_not_found(id))?;

        self.events.publish(&ScheduleEvent::AppointmentUpdated {
            id,
            at: updated.updated_at,
        });

        info!("Successfully updated appointment");
        Ok(updated)
    }

    /// Move an appointment to `to`, then apply the slot side effect, if any.
    #[instrument(
        name = "clinic_schedule.service.transition_appointment",
        skip(self, to),
        fields(appointment_id = %id, to = %to)
    )]
    pub async fn transition_appointment(
        &self,
        id: Uuid,
        to: AppointmentStatus,
    ) -> Result<Appointment, DomainError> {
        info!("Transitioning appointment");

        let current = self.get_appointment(id).await?;
        let from = current.status;
        self.config.transition_policy.check(from, to)?;

        let updated = self
            .appointments
            .update(id, AppointmentChanges::status(to))
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::appointment_not_found(id))?;

        self.events.publish(&ScheduleEvent::AppointmentStatusChanged {
            id,
            from,
            to,
            at: updated.updated_at,
        });

        if let Some(write) = lifecycle::on_transition(to) {
            self.apply_slot_write(id, updated.slot_id, write).await?;
        }

        info!(%from, "Successfully transitioned appointment");
        Ok(updated)
    }

    #[instrument(
        name = "clinic_schedule.service.delete_appointment",
        skip(self),
        fields(appointment_id = %id)
    )]
    pub async fn delete_appointment(&self, id: Uuid) -> Result<(), DomainError> {
        info!("Deleting appointment");

        let appointment = self.get_appointment(id).await?;
        let deleted = self.appointments.delete(id).await.map_err(db_err)?;
        if !deleted {
            return Err(DomainError::appointment_not_found(id));
        }

        self.events.publish(&ScheduleEvent::AppointmentDeleted {
            id,
            slot_id: appointment.slot_id,
            at: Utc::now(),
        });

        self.apply_slot_write(id, appointment.slot_id, lifecycle::on_deleted())
            .await?;

        info!("Successfully deleted appointment");
        Ok(())
    }

    // --- consistency ---

    /// Compare the slot's flag with the appointments that reference it.
    #[instrument(
        name = "clinic_schedule.service.check_slot_consistency",
        skip(self)
    )]
    pub async fn check_slot_consistency(
        &self,
        slot_id: Uuid,
    ) -> Result<SlotConsistency, DomainError> {
        debug!("Checking slot consistency");

        let slot = self.get_slot(slot_id).await?;
        let appointments = self
            .appointments
            .find(&AppointmentQuery::BySlot(slot_id))
            .await
            .map_err(db_err)?;

        let holding: Vec<Uuid> = appointments
            .iter()
            .filter(|a| a.status.holds_slot())
            .map(|a| a.id)
            .collect();
        let expected_available = (!appointments.is_empty()).then(|| holding.is_empty());

        let report = SlotConsistency {
            slot_id,
            is_available: slot.is_available,
            holding,
            appointment_count: appointments.len(),
            expected_available,
        };
        if !report.is_consistent() {
            warn!(
                is_available = report.is_available,
                holding = report.holding.len(),
                "Slot availability disagrees with its appointments"
            );
        }
        Ok(report)
    }

    /// Re-query and write the expected availability if it drifted.
    ///
    /// Slots with no appointment history are left alone; their flag is only
    /// ever set by hand.
    #[instrument(
        name = "clinic_schedule.service.reconcile_slot",
        skip(self)
    )]
    pub async fn reconcile_slot(&self, slot_id: Uuid) -> Result<SlotConsistency, DomainError> {
        info!("Reconciling slot");

        let mut report = self.check_slot_consistency(slot_id).await?;
        let Some(expected) = report.expected_available else {
            return Ok(report);
        };
        if expected == report.is_available {
            return Ok(report);
        }

        let slot = self
            .slots
            .update(slot_id, SlotPatch::availability(expected))
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::slot_not_found(slot_id))?;
        report.is_available = slot.is_available;

        self.events.publish(&ScheduleEvent::SlotReconciled {
            id: slot_id,
            is_available: slot.is_available,
            at: slot.updated_at,
        });

        info!(is_available = slot.is_available, "Successfully reconciled slot");
        Ok(report)
    }

    // --- reports ---

    #[instrument(name = "clinic_schedule.service.daily_schedule", skip(self))]
    pub async fn daily_schedule(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<DailySchedule, DomainError> {
        debug!("Building daily schedule");
        let appointments = self
            .appointments
            .find(&AppointmentQuery::ByDate(date))
            .await
            .map_err(db_err)?;
        Ok(reports::daily_schedule(doctor_id, date, appointments))
    }

    #[instrument(name = "clinic_schedule.service.patient_roster", skip(self))]
    pub async fn patient_roster(&self, doctor_id: &str) -> Result<Vec<PatientRecord>, DomainError> {
        debug!("Building patient roster");
        let appointments = self
            .appointments
            .find(&AppointmentQuery::ByDoctor(doctor_id.to_string()))
            .await
            .map_err(db_err)?;
        let roster = reports::patient_roster(appointments);
        debug!("Roster has {} patients", roster.len());
        Ok(roster)
    }

    // --- helpers ---

    /// Second half of a two-step mutation. The appointment write already
    /// happened, so any failure here is reported as a partial write.
    async fn apply_slot_write(
        &self,
        appointment_id: Uuid,
        slot_id: Uuid,
        write: SlotWrite,
    ) -> Result<TimeSlot, DomainError> {
        let is_available = write.availability();
        match self
            .slots
            .update(slot_id, SlotPatch::availability(is_available))
            .await
        {
            Ok(Some(slot)) => {
                self.events.publish(&ScheduleEvent::SlotUpdated {
                    id: slot_id,
                    is_available,
                    at: slot.updated_at,
                });
                Ok(slot)
            }
            Ok(None) => {
                warn!(%appointment_id, %slot_id, "Slot vanished before availability write");
                Err(DomainError::partial_write(
                    appointment_id,
                    slot_id,
                    "slot no longer exists",
                ))
            }
            Err(e) => {
                warn!(%appointment_id, %slot_id, "Slot availability write failed: {e:#}");
                Err(DomainError::partial_write(
                    appointment_id,
                    slot_id,
                    format!("{e:#}"),
                ))
            }
        }
    }

    fn validate_actor(&self, actor: &Actor) -> Result<(), DomainError> {
        if actor.doctor_id.trim().is_empty() {
            return Err(DomainError::validation("doctor_id", "must not be empty"));
        }
        Ok(())
    }

    fn validate_patient_name(&self, name: &str) -> Result<(), DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("patient_name", "must not be empty"));
        }
        let len = name.chars().count();
        if len > self.config.max_patient_name_length {
            return Err(DomainError::validation(
                "patient_name",
                format!(
                    "too long: {} characters (max: {})",
                    len, self.config.max_patient_name_length
                ),
            ));
        }
        Ok(())
    }

    fn validate_patient_phone(&self, phone: &str) -> Result<(), DomainError> {
        if phone.trim().is_empty() {
            return Err(DomainError::validation("patient_phone", "must not be empty"));
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
