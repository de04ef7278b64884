use crate::contract::model::{Appointment, TimeSlot};

/// Calendar order: date, then start, then end.
pub fn sort_slots(slots: &mut [TimeSlot]) {
    slots.sort_by_key(|s| (s.date, s.start_time, s.end_time));
}

/// Calendar order: date, then start time. Ties keep store order.
pub fn sort_appointments(appointments: &mut [Appointment]) {
    appointments.sort_by_key(|a| (a.date, a.start_time));
}
