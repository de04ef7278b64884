use tracing::info;

use crate::domain::events::ScheduleEvent;
use crate::domain::ports::EventPublisher;

/// Publishes domain events as structured log records.
#[derive(Debug, Clone, Default)]
pub struct LogEventPublisher;

impl EventPublisher<ScheduleEvent> for LogEventPublisher {
    fn publish(&self, event: &ScheduleEvent) {
        match event {
            ScheduleEvent::SlotsCreated { ids, at } => {
                info!(target: "clinic_schedule::events", count = ids.len(), %at, "slots.created")
            }
            ScheduleEvent::SlotUpdated {
                id,
                is_available,
                at,
            } => info!(target: "clinic_schedule::events", slot_id = %id, is_available, %at, "slot.updated"),
            ScheduleEvent::SlotDeleted { id, at } => {
                info!(target: "clinic_schedule::events", slot_id = %id, %at, "slot.deleted")
            }
            ScheduleEvent::AppointmentBooked { id, slot_id, at } => info!(
                target: "clinic_schedule::events",
                appointment_id = %id, slot_id = %slot_id, %at, "appointment.booked"
            ),
            ScheduleEvent::AppointmentUpdated { id, at } => info!(
                target: "clinic_schedule::events",
                appointment_id = %id, %at, "appointment.updated"
            ),
            ScheduleEvent::AppointmentStatusChanged { id, from, to, at } => info!(
                target: "clinic_schedule::events",
                appointment_id = %id, %from, %to, %at, "appointment.status_changed"
            ),
            ScheduleEvent::AppointmentDeleted { id, slot_id, at } => info!(
                target: "clinic_schedule::events",
                appointment_id = %id, slot_id = %slot_id, %at, "appointment.deleted"
            ),
            ScheduleEvent::SlotReconciled {
                id,
                is_available,
                at,
            } => info!(target: "clinic_schedule::events", slot_id = %id, is_available, %at, "slot.reconciled"),
        }
    }
}
