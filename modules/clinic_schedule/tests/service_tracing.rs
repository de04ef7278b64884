//! Tests to verify that the service layer runs cleanly under an active subscriber

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tracing_test::traced_test;
use uuid::Uuid;

use clinic_schedule::contract::model::{
    Actor, AppointmentStatus, NewAppointment, SlotBatch, SlotQuery, TimeSlot,
};
use clinic_schedule::domain::events::ScheduleEvent;
use clinic_schedule::domain::ports::EventPublisher;
use clinic_schedule::domain::repo::{NewTimeSlot, SlotsRepository};
use clinic_schedule::domain::service::{Service, ServiceConfig};
use clinic_schedule::contract::model::SlotPatch;
use clinic_schedule::infra::storage::memory::InMemoryAppointmentsRepository;

// Mock slot repository with a single pre-seeded slot
struct MockSlotsRepository {
    slot: parking_lot::Mutex<TimeSlot>,
}

impl MockSlotsRepository {
    fn new() -> Self {
        let now = chrono::Utc::now();
        Self {
            slot: parking_lot::Mutex::new(TimeSlot {
                id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
                doctor_id: "doc-1".to_string(),
                doctor_name: "Dr. Test".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
                start_time: "09:00".parse().unwrap(),
                end_time: "09:30".parse().unwrap(),
                duration: 30,
                is_available: true,
                created_at: now,
                updated_at: now,
            }),
        }
    }

    fn id(&self) -> Uuid {
        self.slot.lock().id
    }
}

#[async_trait::async_trait]
impl SlotsRepository for MockSlotsRepository {
    async fn create(&self, new_slot: NewTimeSlot) -> Result<TimeSlot> {
        let now = chrono::Utc::now();
        Ok(TimeSlot {
            id: Uuid::new_v4(),
            doctor_id: new_slot.doctor_id,
            doctor_name: new_slot.doctor_name,
            date: new_slot.date,
            start_time: new_slot.start_time,
            end_time: new_slot.end_time,
            duration: new_slot.duration,
            is_available: new_slot.is_available,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeSlot>> {
        let slot = self.slot.lock();
        Ok((slot.id == id).then(|| slot.clone()))
    }

    async fn update(&self, id: Uuid, patch: SlotPatch) -> Result<Option<TimeSlot>> {
        let mut slot = self.slot.lock();
        if slot.id != id {
            return Ok(None);
        }
        if let Some(is_available) = patch.is_available {
            slot.is_available = is_available;
        }
        Ok(Some(slot.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.slot.lock().id == id)
    }

    async fn find(&self, _query: &SlotQuery) -> Result<Vec<TimeSlot>> {
        Ok(vec![self.slot.lock().clone()])
    }
}

// Mock event publisher for testing
#[derive(Clone)]
struct MockEventPublisher;

impl EventPublisher<ScheduleEvent> for MockEventPublisher {
    fn publish(&self, _event: &ScheduleEvent) {}
}

fn doctor() -> Actor {
    Actor {
        doctor_id: "doc-1".to_string(),
        doctor_name: "Dr. Test".to_string(),
    }
}

fn service_with(slots: Arc<MockSlotsRepository>) -> Service {
    Service::new(
        slots,
        Arc::new(InMemoryAppointmentsRepository::new()),
        Arc::new(MockEventPublisher),
        ServiceConfig::default(),
    )
}

#[traced_test]
#[tokio::test]
async fn get_slot_emits_spans() {
    let slots = Arc::new(MockSlotsRepository::new());
    let id = slots.id();
    let service = service_with(slots);

    let result = service.get_slot(id).await;

    assert!(result.is_ok());
}

#[traced_test]
#[tokio::test]
async fn create_slot_batch_emits_spans() {
    let service = service_with(Arc::new(MockSlotsRepository::new()));
    let batch = SlotBatch {
        date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
        start_time: "14:00".to_string(),
        end_time: "15:00".to_string(),
        duration: 20,
    };

    let result = service.create_slot_batch(&doctor(), batch).await;

    assert_eq!(result.map(|s| s.len()).ok(), Some(3));
}

#[traced_test]
#[tokio::test]
async fn booking_and_transition_emit_spans() {
    let slots = Arc::new(MockSlotsRepository::new());
    let slot_id = slots.id();
    let service = service_with(slots);

    let booked = service
        .book_appointment(
            &doctor(),
            NewAppointment {
                slot_id,
                patient_name: "Test Patient".to_string(),
                patient_phone: "555-0100".to_string(),
                patient_email: Some("patient@example.com".to_string()),
                notes: None,
            },
        )
        .await;
    assert!(booked.is_ok());

    let moved = service
        .transition_appointment(booked.unwrap().id, AppointmentStatus::NoShow)
        .await;
    assert!(moved.is_ok());
    assert!(service.get_slot(slot_id).await.unwrap().is_available);
}

#[traced_test]
#[tokio::test]
async fn consistency_check_emits_spans() {
    let slots = Arc::new(MockSlotsRepository::new());
    let slot_id = slots.id();
    let service = service_with(slots);

    let report = service.check_slot_consistency(slot_id).await;

    assert!(report.is_ok_and(|r| r.is_consistent()));
}

#[traced_test]
#[tokio::test]
async fn preview_emits_spans() {
    let service = service_with(Arc::new(MockSlotsRepository::new()));

    let slots = service.preview_slots("09:00", "10:00", 15);

    assert_eq!(slots.len(), 4);
}
