use anyhow::Context;
use chrono::NaiveDate;

use crate::contract::model::{Appointment, AppointmentStatus, TimeSlot};
use crate::contract::time::WallTime;
use crate::infra::storage::entity::{appointment, slot};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn time_to_db(time: WallTime) -> String {
    time.to_string()
}

fn date_from_db(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).with_context(|| format!("bad stored date '{raw}'"))
}

fn time_from_db(raw: &str) -> anyhow::Result<WallTime> {
    raw.parse()
        .with_context(|| format!("bad stored time '{raw}'"))
}

/// Convert a slot row to a contract model
pub fn slot_to_contract(row: slot::Model) -> anyhow::Result<TimeSlot> {
    Ok(TimeSlot {
        id: row.id,
        doctor_id: row.doctor_id,
        doctor_name: row.doctor_name,
        date: date_from_db(&row.date)?,
        start_time: time_from_db(&row.start_time)?,
        end_time: time_from_db(&row.end_time)?,
        duration: u32::try_from(row.duration)
            .with_context(|| format!("bad stored duration {}", row.duration))?,
        is_available: row.is_available,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Convert an appointment row to a contract model
pub fn appointment_to_contract(row: appointment::Model) -> anyhow::Result<Appointment> {
    let status: AppointmentStatus = row.status.parse()?;
    Ok(Appointment {
        id: row.id,
        slot_id: row.slot_id,
        patient_name: row.patient_name,
        patient_phone: row.patient_phone,
        patient_email: row.patient_email,
        date: date_from_db(&row.date)?,
        start_time: time_from_db(&row.start_time)?,
        end_time: time_from_db(&row.end_time)?,
        doctor_id: row.doctor_id,
        doctor_name: row.doctor_name,
        status,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn row() -> slot::Model {
        slot::Model {
            id: Uuid::new_v4(),
            doctor_id: "doc-1".into(),
            doctor_name: "Dr. Ada".into(),
            date: "2025-03-14".into(),
            start_time: "09:00".into(),
            end_time: "09:30".into(),
            duration: 30,
            is_available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn slot_row_maps_to_contract() {
        let slot = slot_to_contract(row()).unwrap();
        assert_eq!(date_to_db(slot.date), "2025-03-14");
        assert_eq!(time_to_db(slot.start_time), "09:00");
        assert_eq!(slot.duration, 30);
    }

    #[test]
    fn corrupt_rows_are_reported() {
        let mut bad = row();
        bad.start_time = "9:00".into();
        let err = slot_to_contract(bad).unwrap_err();
        assert!(err.to_string().contains("bad stored time '9:00'"));

        let mut bad = row();
        bad.duration = -5;
        assert!(slot_to_contract(bad).is_err());
    }
}
