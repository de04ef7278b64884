use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::contract::model::{Appointment, DailySchedule, PatientRecord, StatusCounts};
use crate::domain::ordering::sort_appointments;

/// Key used to decide that two appointments belong to the same patient.
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Appointments of `doctor_id` on `date`, by start time, with status counts.
pub fn daily_schedule(
    doctor_id: &str,
    date: NaiveDate,
    appointments: Vec<Appointment>,
) -> DailySchedule {
    let mut day: Vec<Appointment> = appointments
        .into_iter()
        .filter(|a| a.date == date && a.doctor_id == doctor_id)
        .collect();
    day.sort_by_key(|a| a.start_time);

    let mut counts = StatusCounts::default();
    for a in &day {
        counts.record(a.status);
    }

    DailySchedule {
        doctor_id: doctor_id.to_string(),
        date,
        appointments: day,
        counts,
    }
}

/// Group appointments into patients keyed by normalised phone.
///
/// Contact details come from the most recent appointment of each group.
/// Patients are ordered by name, ignoring case.
pub fn patient_roster(appointments: Vec<Appointment>) -> Vec<PatientRecord> {
    let mut by_phone: BTreeMap<String, Vec<Appointment>> = BTreeMap::new();
    for a in appointments {
        by_phone
            .entry(normalize_phone(&a.patient_phone))
            .or_default()
            .push(a);
    }

    let mut roster: Vec<PatientRecord> = by_phone
        .into_values()
        .filter_map(|mut list| {
            sort_appointments(&mut list);
            let latest = list.last()?.clone();
            Some(PatientRecord {
                patient_name: latest.patient_name,
                patient_phone: latest.patient_phone,
                patient_email: latest.patient_email.filter(|e| !e.is_empty()),
                last_appointment_date: latest.date,
                last_appointment_time: latest.start_time,
                appointments: list,
            })
        })
        .collect();

    roster.sort_by_cached_key(|p| p.patient_name.to_lowercase());
    roster
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::AppointmentStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn appt(name: &str, phone: &str, date: &str, start: &str, status: AppointmentStatus) -> Appointment {
        let start_time = start.parse().unwrap();
        Appointment {
            id: Uuid::new_v4(),
            slot_id: Uuid::new_v4(),
            patient_name: name.into(),
            patient_phone: phone.into(),
            patient_email: None,
            date: date.parse().unwrap(),
            start_time,
            end_time: start_time,
            doctor_id: "doc-1".into(),
            doctor_name: "Dr. Ada".into(),
            status,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn phone_normalisation() {
        assert_eq!(normalize_phone("555 123-4567"), "5551234567");
        assert_eq!(normalize_phone(" +1-555\t0000 "), "+15550000");
    }

    #[test]
    fn daily_schedule_filters_sorts_and_counts() {
        use AppointmentStatus::*;
        let mut other_doctor = appt("Eve", "1", "2025-03-14", "08:00", Scheduled);
        other_doctor.doctor_id = "doc-2".into();
        let all = vec![
            appt("Bob", "2", "2025-03-14", "11:00", Confirmed),
            appt("Ann", "3", "2025-03-14", "09:00", Scheduled),
            appt("Cid", "4", "2025-03-15", "09:00", Scheduled),
            appt("Dee", "5", "2025-03-14", "10:00", NoShow),
            other_doctor,
        ];

        let day = daily_schedule("doc-1", "2025-03-14".parse().unwrap(), all);
        let names: Vec<_> = day.appointments.iter().map(|a| a.patient_name.as_str()).collect();
        assert_eq!(names, ["Ann", "Dee", "Bob"]);
        assert_eq!(day.counts.total, 3);
        assert_eq!(day.counts.scheduled, 1);
        assert_eq!(day.counts.confirmed, 1);
        assert_eq!(day.counts.no_show, 1);
        assert_eq!(day.counts.cancelled, 0);
    }

    #[test]
    fn roster_groups_by_normalised_phone() {
        use AppointmentStatus::*;
        let mut latest = appt("Robert Smith", "555-0101", "2025-04-02", "10:00", Scheduled);
        latest.patient_email = Some("rob@example.com".into());
        let all = vec![
            appt("Bob Smith", "555 0101", "2025-03-01", "09:00", Completed),
            latest,
            appt("alice", "555-0202", "2025-03-05", "14:30", Cancelled),
        ];

        let roster = patient_roster(all);
        assert_eq!(roster.len(), 2);

        assert_eq!(roster[0].patient_name, "alice");
        let rob = &roster[1];
        assert_eq!(rob.patient_name, "Robert Smith");
        assert_eq!(rob.patient_email.as_deref(), Some("rob@example.com"));
        assert_eq!(rob.appointments.len(), 2);
        assert_eq!(rob.last_appointment_date, "2025-04-02".parse().unwrap());
        assert_eq!(rob.last_appointment_time.to_string(), "10:00");
        assert_eq!(rob.appointments[0].patient_name, "Bob Smith");
    }

    #[test]
    fn roster_name_order_ignores_case() {
        use AppointmentStatus::*;
        let roster = patient_roster(vec![
            appt("zed", "1", "2025-01-01", "09:00", Scheduled),
            appt("Amy", "2", "2025-01-01", "09:00", Scheduled),
            appt("bea", "3", "2025-01-01", "09:00", Scheduled),
        ]);
        let names: Vec<_> = roster.iter().map(|p| p.patient_name.as_str()).collect();
        assert_eq!(names, ["Amy", "bea", "zed"]);
    }
}
