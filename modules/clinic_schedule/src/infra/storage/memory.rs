//! In-process repositories. Back the `--mock` server mode and the test suites.
//!
//! Both can be told to fail writes so that partial-failure paths are reachable
//! without a real database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::contract::model::{Appointment, AppointmentQuery, SlotPatch, SlotQuery, TimeSlot};
use crate::domain::repo::{
    AppointmentChanges, AppointmentsRepository, NewAppointmentRecord, NewTimeSlot,
    SlotsRepository,
};

/// Write-failure switches shared by both repositories.
#[derive(Debug)]
struct Faults {
    /// Inserts left before every further insert fails. `usize::MAX` means never.
    creates_left: AtomicUsize,
    fail_updates: AtomicBool,
}

impl Faults {
    fn new() -> Self {
        Self {
            creates_left: AtomicUsize::new(usize::MAX),
            fail_updates: AtomicBool::new(false),
        }
    }

    fn take_create(&self) -> anyhow::Result<()> {
        let granted = self
            .creates_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                usize::MAX => Some(usize::MAX),
                0 => None,
                n => Some(n - 1),
            })
            .is_ok();
        if granted {
            Ok(())
        } else {
            anyhow::bail!("injected insert failure")
        }
    }

    fn check_update(&self) -> anyhow::Result<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            anyhow::bail!("injected update failure");
        }
        Ok(())
    }
}

pub struct InMemorySlotsRepository {
    rows: RwLock<HashMap<Uuid, TimeSlot>>,
    faults: Faults,
}

impl Default for InMemorySlotsRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySlotsRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            faults: Faults::new(),
        }
    }

    /// Let the next `n` inserts succeed and fail every one after that.
    pub fn fail_creates_after(&self, n: usize) {
        self.faults.creates_left.store(n, Ordering::SeqCst);
    }

    /// Make every update fail until switched off again.
    pub fn fail_updates(&self, fail: bool) {
        self.faults.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl SlotsRepository for InMemorySlotsRepository {
    async fn create(&self, s: NewTimeSlot) -> anyhow::Result<TimeSlot> {
        self.faults.take_create()?;
        let now = Utc::now();
        let slot = TimeSlot {
            id: Uuid::new_v4(),
            doctor_id: s.doctor_id,
            doctor_name: s.doctor_name,
            date: s.date,
            start_time: s.start_time,
            end_time: s.end_time,
            duration: s.duration,
            is_available: s.is_available,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().insert(slot.id, slot.clone());
        Ok(slot)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<TimeSlot>> {
        Ok(self.rows.read().get(&id).cloned())
    }

    async fn update(&self, id: Uuid, patch: SlotPatch) -> anyhow::Result<Option<TimeSlot>> {
        self.faults.check_update()?;
        let mut rows = self.rows.write();
        let Some(slot) = rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(date) = patch.date {
            slot.date = date;
        }
        if let Some(start) = patch.start_time {
            slot.start_time = start;
        }
        if let Some(end) = patch.end_time {
            slot.end_time = end;
        }
        if let Some(duration) = patch.duration {
            slot.duration = duration;
        }
        if let Some(is_available) = patch.is_available {
            slot.is_available = is_available;
        }
        slot.updated_at = Utc::now();
        Ok(Some(slot.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.rows.write().remove(&id).is_some())
    }

    async fn find(&self, query: &SlotQuery) -> anyhow::Result<Vec<TimeSlot>> {
        let rows = self.rows.read();
        let matches = |s: &TimeSlot| match query {
            SlotQuery::ByDoctor(doctor_id) => &s.doctor_id == doctor_id,
            SlotQuery::ByDate(date) => &s.date == date,
            SlotQuery::Available { date } => {
                s.is_available && date.map_or(true, |d| s.date == d)
            }
        };
        Ok(rows.values().filter(|s| matches(s)).cloned().collect())
    }
}

pub struct InMemoryAppointmentsRepository {
    rows: RwLock<HashMap<Uuid, Appointment>>,
    faults: Faults,
}

impl Default for InMemoryAppointmentsRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAppointmentsRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            faults: Faults::new(),
        }
    }

    pub fn fail_creates_after(&self, n: usize) {
        self.faults.creates_left.store(n, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.faults.fail_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AppointmentsRepository for InMemoryAppointmentsRepository {
    async fn create(&self, a: NewAppointmentRecord) -> anyhow::Result<Appointment> {
        self.faults.take_create()?;
        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            slot_id: a.slot_id,
            patient_name: a.patient_name,
            patient_phone: a.patient_phone,
            patient_email: a.patient_email,
            date: a.date,
            start_time: a.start_time,
            end_time: a.end_time,
            doctor_id: a.doctor_id,
            doctor_name: a.doctor_name,
            status: a.status,
            notes: a.notes,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Appointment>> {
        Ok(self.rows.read().get(&id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> anyhow::Result<Option<Appointment>> {
        self.faults.check_update()?;
        let mut rows = self.rows.write();
        let Some(a) = rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.patient_name {
            a.patient_name = name;
        }
        if let Some(phone) = changes.patient_phone {
            a.patient_phone = phone;
        }
        if let Some(email) = changes.patient_email {
            a.patient_email = Some(email);
        }
        if let Some(notes) = changes.notes {
            a.notes = Some(notes);
        }
        if let Some(status) = changes.status {
            a.status = status;
        }
        a.updated_at = Utc::now();
        Ok(Some(a.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.rows.write().remove(&id).is_some())
    }

    async fn find(&self, query: &AppointmentQuery) -> anyhow::Result<Vec<Appointment>> {
        let rows = self.rows.read();
        let matches = |a: &Appointment| match query {
            AppointmentQuery::All => true,
            AppointmentQuery::ByDoctor(doctor_id) => &a.doctor_id == doctor_id,
            AppointmentQuery::ByDate(date) => &a.date == date,
            AppointmentQuery::ByStatus(status) => &a.status == status,
            AppointmentQuery::BySlot(slot_id) => &a.slot_id == slot_id,
        };
        Ok(rows.values().filter(|a| matches(a)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draft(start: &str) -> NewTimeSlot {
        let start_time = start.parse().unwrap();
        NewTimeSlot {
            doctor_id: "doc-1".into(),
            doctor_name: "Dr. Ada".into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            start_time,
            end_time: start_time,
            duration: 30,
            is_available: true,
        }
    }

    #[tokio::test]
    async fn assigns_ids_and_applies_partial_updates() {
        let repo = InMemorySlotsRepository::new();
        let a = repo.create(draft("09:00")).await.unwrap();
        let b = repo.create(draft("09:30")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(repo.len(), 2);

        let updated = repo
            .update(a.id, SlotPatch::availability(false))
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.is_available);
        assert_eq!(updated.start_time, a.start_time);

        assert!(repo
            .update(Uuid::new_v4(), SlotPatch::default())
            .await
            .unwrap()
            .is_none());

        let available = repo
            .find(&SlotQuery::Available { date: None })
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, b.id);
    }

    #[tokio::test]
    async fn injected_create_failures_kick_in_after_quota() {
        let repo = InMemorySlotsRepository::new();
        repo.fail_creates_after(1);
        assert!(repo.create(draft("09:00")).await.is_ok());
        assert!(repo.create(draft("09:30")).await.is_err());
        assert!(repo.create(draft("10:00")).await.is_err());
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn injected_update_failures_can_be_switched_off() {
        let repo = InMemorySlotsRepository::new();
        let slot = repo.create(draft("09:00")).await.unwrap();
        repo.fail_updates(true);
        assert!(repo
            .update(slot.id, SlotPatch::availability(false))
            .await
            .is_err());
        repo.fail_updates(false);
        assert!(repo
            .update(slot.id, SlotPatch::availability(false))
            .await
            .is_ok());
    }
}
