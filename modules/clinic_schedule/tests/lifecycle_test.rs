//! Slot/appointment coupling exercised through the domain service on in-memory storage.

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use parking_lot::Mutex;
use uuid::Uuid;

use clinic_schedule::contract::model::{
    Actor, AppointmentQuery, AppointmentStatus, NewAppointment, SlotBatch, SlotPatch, SlotQuery,
    TimeSlot,
};
use clinic_schedule::domain::error::DomainError;
use clinic_schedule::domain::events::ScheduleEvent;
use clinic_schedule::domain::lifecycle::TransitionPolicy;
use clinic_schedule::domain::ports::EventPublisher;
use clinic_schedule::domain::service::{Service, ServiceConfig};
use clinic_schedule::infra::storage::memory::{
    InMemoryAppointmentsRepository, InMemorySlotsRepository,
};

#[derive(Default)]
struct RecordingPublisher {
    events: Mutex<Vec<ScheduleEvent>>,
}

impl EventPublisher<ScheduleEvent> for RecordingPublisher {
    fn publish(&self, event: &ScheduleEvent) {
        self.events.lock().push(event.clone());
    }
}

struct Harness {
    service: Service,
    slots: Arc<InMemorySlotsRepository>,
    appointments: Arc<InMemoryAppointmentsRepository>,
    events: Arc<RecordingPublisher>,
}

fn harness_with(config: ServiceConfig) -> Harness {
    let slots = Arc::new(InMemorySlotsRepository::new());
    let appointments = Arc::new(InMemoryAppointmentsRepository::new());
    let events = Arc::new(RecordingPublisher::default());
    let service = Service::new(slots.clone(), appointments.clone(), events.clone(), config);
    Harness {
        service,
        slots,
        appointments,
        events,
    }
}

fn harness() -> Harness {
    harness_with(ServiceConfig::default())
}

fn doctor() -> Actor {
    Actor {
        doctor_id: "doc-1".to_string(),
        doctor_name: "Dr. Ada Lovelace".to_string(),
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

fn batch(start: &str, end: &str, duration: i64) -> SlotBatch {
    SlotBatch {
        date: day(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        duration,
    }
}

fn booking(slot_id: Uuid, name: &str, phone: &str) -> NewAppointment {
    NewAppointment {
        slot_id,
        patient_name: name.to_string(),
        patient_phone: phone.to_string(),
        patient_email: None,
        notes: None,
    }
}

async fn one_slot(h: &Harness) -> Result<TimeSlot> {
    let mut slots = h
        .service
        .create_slot_batch(&doctor(), batch("09:00", "09:30", 30))
        .await?;
    Ok(slots.remove(0))
}

#[tokio::test]
async fn batch_creates_contiguous_available_slots() -> Result<()> {
    let h = harness();

    let slots = h
        .service
        .create_slot_batch(&doctor(), batch("09:00", "10:10", 30))
        .await?;

    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].start_time.to_string(), "09:00");
    assert_eq!(slots[0].end_time, slots[1].start_time);
    assert_eq!(slots[1].end_time.to_string(), "10:00");
    assert!(slots.iter().all(|s| s.is_available && s.duration == 30));
    assert!(slots.iter().all(|s| s.doctor_name == "Dr. Ada Lovelace"));
    assert_eq!(h.slots.len(), 2);
    Ok(())
}

#[tokio::test]
async fn batch_declines_bad_windows_with_explanation() {
    let h = harness();

    let err = h
        .service
        .create_slot_batch(&doctor(), batch("10:00", "09:00", 30))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTimeWindow { .. }));
    assert!(err.to_string().contains("must be before"));

    let err = h
        .service
        .create_slot_batch(&doctor(), batch("09:00", "09:20", 30))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::EmptyPartition { .. }));

    let err = h
        .service
        .create_slot_batch(&doctor(), batch("09:00", "10:00", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTimeWindow { .. }));

    let err = h
        .service
        .create_slot_batch(&doctor(), batch("09:00", "10:00", i64::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::EmptyPartition { .. }));

    assert!(h.slots.is_empty());
}

#[tokio::test]
async fn batch_respects_size_limit() {
    let h = harness_with(ServiceConfig {
        max_slots_per_batch: 4,
        ..ServiceConfig::default()
    });

    let err = h
        .service
        .create_slot_batch(&doctor(), batch("08:00", "12:00", 30))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::TooManySlots { count: 8, max: 4 }
    ));
    assert!(h.slots.is_empty());
}

#[tokio::test]
async fn batch_partial_failure_keeps_successful_writes() {
    let h = harness();
    h.slots.fail_creates_after(3);

    let err = h
        .service
        .create_slot_batch(&doctor(), batch("09:00", "12:00", 30))
        .await
        .unwrap_err();

    match err {
        DomainError::BatchIncomplete {
            created, failed, ..
        } => {
            assert_eq!(created, 3);
            assert_eq!(failed, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // No rollback.
    assert_eq!(h.slots.len(), 3);
}

#[tokio::test]
async fn booking_marks_slot_unavailable() -> Result<()> {
    let h = harness();
    let slot = one_slot(&h).await?;

    let appointment = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "Grace Hopper", "555-0101"))
        .await?;

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.slot_id, slot.id);
    assert_eq!(appointment.date, slot.date);
    assert_eq!(appointment.start_time, slot.start_time);
    assert_eq!(appointment.end_time, slot.end_time);
    assert_eq!(appointment.doctor_name, slot.doctor_name);

    let slot = h.service.get_slot(slot.id).await?;
    assert!(!slot.is_available);
    Ok(())
}

#[tokio::test]
async fn booking_an_unavailable_slot_is_declined() -> Result<()> {
    let h = harness();
    let slot = one_slot(&h).await?;
    h.service
        .book_appointment(&doctor(), booking(slot.id, "Grace Hopper", "555-0101"))
        .await?;

    let err = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "Alan Turing", "555-0202"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::SlotUnavailable { id } if id == slot.id));

    let err = h
        .service
        .book_appointment(&doctor(), booking(Uuid::new_v4(), "Alan Turing", "555-0202"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::SlotNotFound { .. }));

    let all = h.service.list_appointments(AppointmentQuery::All).await?;
    assert_eq!(all.len(), 1);
    Ok(())
}

#[tokio::test]
async fn booking_validates_patient_fields() -> Result<()> {
    let h = harness();
    let slot = one_slot(&h).await?;

    let err = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "   ", "555-0101"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "patient_name"));

    let err = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "Grace", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "patient_phone"));

    let long_name = "x".repeat(101);
    let err = h
        .service
        .book_appointment(&doctor(), booking(slot.id, &long_name, "555"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));

    assert!(h.service.get_slot(slot.id).await?.is_available);
    Ok(())
}

#[tokio::test]
async fn cancel_and_no_show_release_the_slot() -> Result<()> {
    for released_by in [AppointmentStatus::Cancelled, AppointmentStatus::NoShow] {
        let h = harness();
        let slot = one_slot(&h).await?;
        let appointment = h
            .service
            .book_appointment(&doctor(), booking(slot.id, "Grace Hopper", "555-0101"))
            .await?;

        let moved = h
            .service
            .transition_appointment(appointment.id, released_by)
            .await?;
        assert_eq!(moved.status, released_by);
        assert!(h.service.get_slot(slot.id).await?.is_available);
    }
    Ok(())
}

#[tokio::test]
async fn confirm_and_complete_leave_the_slot_booked() -> Result<()> {
    let h = harness();
    let slot = one_slot(&h).await?;
    let appointment = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "Grace Hopper", "555-0101"))
        .await?;

    h.service
        .transition_appointment(appointment.id, AppointmentStatus::Confirmed)
        .await?;
    assert!(!h.service.get_slot(slot.id).await?.is_available);

    h.service
        .transition_appointment(appointment.id, AppointmentStatus::Completed)
        .await?;
    assert!(!h.service.get_slot(slot.id).await?.is_available);
    Ok(())
}

#[tokio::test]
async fn rescheduling_a_cancelled_appointment_does_not_rebook() -> Result<()> {
    let h = harness();
    let slot = one_slot(&h).await?;
    let appointment = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "Grace Hopper", "555-0101"))
        .await?;

    h.service
        .transition_appointment(appointment.id, AppointmentStatus::Cancelled)
        .await?;
    h.service
        .transition_appointment(appointment.id, AppointmentStatus::Scheduled)
        .await?;

    // Permissive policy accepts the move, and no slot write follows it.
    assert!(h.service.get_slot(slot.id).await?.is_available);
    let report = h.service.check_slot_consistency(slot.id).await?;
    assert!(!report.is_consistent());
    Ok(())
}

#[tokio::test]
async fn deleting_the_appointment_releases_the_slot() -> Result<()> {
    let h = harness();
    let slot = one_slot(&h).await?;
    let appointment = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "Grace Hopper", "555-0101"))
        .await?;

    h.service.delete_appointment(appointment.id).await?;

    assert!(h.service.get_slot(slot.id).await?.is_available);
    assert!(matches!(
        h.service.get_appointment(appointment.id).await,
        Err(DomainError::AppointmentNotFound { .. })
    ));
    assert!(matches!(
        h.service.delete_appointment(appointment.id).await,
        Err(DomainError::AppointmentNotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn failed_slot_write_is_reported_and_reconcilable() -> Result<()> {
    let h = harness();
    let slot = one_slot(&h).await?;

    h.slots.fail_updates(true);
    let err = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "Grace Hopper", "555-0101"))
        .await
        .unwrap_err();
    let appointment_id = match err {
        DomainError::PartialWrite {
            appointment_id,
            slot_id,
            ..
        } => {
            assert_eq!(slot_id, slot.id);
            appointment_id
        }
        other => panic!("unexpected error: {other:?}"),
    };
    h.slots.fail_updates(false);

    // The appointment exists but the slot still looks free.
    let stored = h.service.get_appointment(appointment_id).await?;
    assert_eq!(stored.status, AppointmentStatus::Scheduled);
    let report = h.service.check_slot_consistency(slot.id).await?;
    assert!(report.is_available);
    assert_eq!(report.expected_available, Some(false));
    assert!(!report.is_consistent());

    let repaired = h.service.reconcile_slot(slot.id).await?;
    assert!(repaired.is_consistent());
    assert!(!h.service.get_slot(slot.id).await?.is_available);
    Ok(())
}

#[tokio::test]
async fn reconcile_leaves_slots_without_history_alone() -> Result<()> {
    let h = harness();
    let slot = one_slot(&h).await?;
    h.service.set_slot_availability(slot.id, false).await?;

    let report = h.service.reconcile_slot(slot.id).await?;
    assert_eq!(report.expected_available, None);
    assert!(report.is_consistent());
    assert!(!h.service.get_slot(slot.id).await?.is_available);
    Ok(())
}

#[tokio::test]
async fn double_booking_is_visible_in_consistency_report() -> Result<()> {
    let h = harness();
    let slot = one_slot(&h).await?;
    let first = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "Grace Hopper", "555-0101"))
        .await?;

    // Manual re-open, then a second booking on the same slot.
    h.service.set_slot_availability(slot.id, true).await?;
    let second = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "Alan Turing", "555-0202"))
        .await?;

    let report = h.service.check_slot_consistency(slot.id).await?;
    assert!(report.is_double_booked());
    assert!(report.holding.contains(&first.id));
    assert!(report.holding.contains(&second.id));
    assert_eq!(report.appointment_count, 2);
    Ok(())
}

#[tokio::test]
async fn strict_policy_rejects_backward_moves() -> Result<()> {
    let h = harness_with(ServiceConfig {
        transition_policy: TransitionPolicy::Strict,
        ..ServiceConfig::default()
    });
    let slot = one_slot(&h).await?;
    let appointment = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "Grace Hopper", "555-0101"))
        .await?;

    h.service
        .transition_appointment(appointment.id, AppointmentStatus::Completed)
        .await?;
    let err = h
        .service
        .transition_appointment(appointment.id, AppointmentStatus::Scheduled)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::InvalidTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Scheduled
        }
    ));

    let stored = h.service.get_appointment(appointment.id).await?;
    assert_eq!(stored.status, AppointmentStatus::Completed);
    Ok(())
}

#[tokio::test]
async fn appointment_keeps_booking_time_copies_after_slot_edit() -> Result<()> {
    let h = harness();
    let slot = one_slot(&h).await?;
    let appointment = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "Grace Hopper", "555-0101"))
        .await?;

    h.service
        .update_slot(
            slot.id,
            SlotPatch {
                start_time: Some("11:00".parse()?),
                end_time: Some("11:45".parse()?),
                ..Default::default()
            },
        )
        .await?;

    let edited = h.service.get_slot(slot.id).await?;
    // Duration is not recomputed on edit.
    assert_eq!(edited.duration, 30);
    let stored = h.service.get_appointment(appointment.id).await?;
    assert_eq!(stored.start_time.to_string(), "09:00");
    Ok(())
}

#[tokio::test]
async fn slot_edit_checks_moved_bound_against_stored_one() -> Result<()> {
    let h = harness();
    let slot = one_slot(&h).await?;

    let err = h
        .service
        .update_slot(
            slot.id,
            SlotPatch {
                start_time: Some("10:00".parse()?),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTimeWindow { .. }));

    let err = h
        .service
        .update_slot(
            slot.id,
            SlotPatch {
                end_time: Some("08:30".parse()?),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTimeWindow { .. }));

    let moved = h
        .service
        .update_slot(
            slot.id,
            SlotPatch {
                end_time: Some("09:45".parse()?),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(moved.start_time.to_string(), "09:00");
    assert_eq!(moved.end_time.to_string(), "09:45");

    let err = h
        .service
        .update_slot(
            Uuid::new_v4(),
            SlotPatch {
                start_time: Some("09:10".parse()?),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::SlotNotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn listings_come_back_in_calendar_order() -> Result<()> {
    let h = harness();
    let later = SlotBatch {
        date: day().succ_opt().unwrap(),
        ..batch("08:00", "09:00", 30)
    };
    h.service.create_slot_batch(&doctor(), later).await?;
    h.service
        .create_slot_batch(&doctor(), batch("13:00", "14:00", 30))
        .await?;
    h.service
        .create_slot_batch(&doctor(), batch("09:00", "10:00", 30))
        .await?;

    let slots = h
        .service
        .list_slots(SlotQuery::ByDoctor("doc-1".into()))
        .await?;
    let keys: Vec<_> = slots
        .iter()
        .map(|s| (s.date, s.start_time, s.end_time))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    assert_eq!(slots.len(), 6);

    let free_today = h
        .service
        .list_slots(SlotQuery::Available { date: Some(day()) })
        .await?;
    assert_eq!(free_today.len(), 4);
    Ok(())
}

#[tokio::test]
async fn mutations_publish_events() -> Result<()> {
    let h = harness();
    let slot = one_slot(&h).await?;
    let appointment = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "Grace Hopper", "555-0101"))
        .await?;
    h.service
        .transition_appointment(appointment.id, AppointmentStatus::Cancelled)
        .await?;

    let events = h.events.events.lock();
    assert!(matches!(events[0], ScheduleEvent::SlotsCreated { ref ids, .. } if ids.len() == 1));
    assert!(events
        .iter()
        .any(|e| matches!(e, ScheduleEvent::AppointmentBooked { id, .. } if *id == appointment.id)));
    assert!(events.iter().any(|e| matches!(
        e,
        ScheduleEvent::AppointmentStatusChanged {
            to: AppointmentStatus::Cancelled,
            ..
        }
    )));
    assert!(matches!(
        events.last(),
        Some(ScheduleEvent::SlotUpdated {
            is_available: true,
            ..
        })
    ));
    Ok(())
}

#[tokio::test]
async fn appointment_create_failure_leaves_slot_untouched() -> Result<()> {
    let h = harness();
    let slot = one_slot(&h).await?;
    h.appointments.fail_creates_after(0);

    let err = h
        .service
        .book_appointment(&doctor(), booking(slot.id, "Grace Hopper", "555-0101"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Database { .. }));
    assert!(h.service.get_slot(slot.id).await?.is_available);
    Ok(())
}

#[tokio::test]
async fn reports_group_the_doctors_day_and_patients() -> Result<()> {
    let h = harness();
    let slots = h
        .service
        .create_slot_batch(&doctor(), batch("09:00", "10:30", 30))
        .await?;

    let a = h
        .service
        .book_appointment(&doctor(), booking(slots[2].id, "Grace Hopper", "555 0101"))
        .await?;
    h.service
        .book_appointment(&doctor(), booking(slots[0].id, "Grace B. Hopper", "555-0101"))
        .await?;
    h.service
        .book_appointment(&doctor(), booking(slots[1].id, "alan Turing", "555-0202"))
        .await?;
    h.service
        .transition_appointment(a.id, AppointmentStatus::Confirmed)
        .await?;

    let schedule = h.service.daily_schedule("doc-1", day()).await?;
    let starts: Vec<String> = schedule
        .appointments
        .iter()
        .map(|a| a.start_time.to_string())
        .collect();
    assert_eq!(starts, ["09:00", "09:30", "10:00"]);
    assert_eq!(schedule.counts.total, 3);
    assert_eq!(schedule.counts.confirmed, 1);
    assert_eq!(schedule.counts.scheduled, 2);

    let roster = h.service.patient_roster("doc-1").await?;
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].patient_name, "alan Turing");
    // Latest appointment by time wins for contact details.
    assert_eq!(roster[1].patient_name, "Grace Hopper");
    assert_eq!(roster[1].appointments.len(), 2);
    assert_eq!(roster[1].last_appointment_time.to_string(), "10:00");
    Ok(())
}
