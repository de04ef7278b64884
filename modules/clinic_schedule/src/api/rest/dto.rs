use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::model::{
    Appointment, AppointmentPatch, AppointmentQuery, AppointmentStatus, DailySchedule,
    NewAppointment, NewSlot, PatientRecord, SlotBatch, SlotConsistency, SlotInterval, SlotPatch,
    SlotQuery, StatusCounts, TimeSlot,
};
use crate::contract::time::WallTime;

/// A request field that deserialized but does not hold a usable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

fn parse_time(field: &'static str, raw: &str) -> Result<WallTime, FieldError> {
    raw.parse().map_err(|e: crate::contract::time::ParseWallTimeError| FieldError {
        field,
        message: e.to_string(),
    })
}

fn parse_opt_time(field: &'static str, raw: Option<String>) -> Result<Option<WallTime>, FieldError> {
    raw.map(|r| parse_time(field, &r)).transpose()
}

pub fn parse_status(raw: &str) -> Result<AppointmentStatus, FieldError> {
    raw.parse().map_err(|e: crate::contract::model::UnknownStatus| FieldError {
        field: "status",
        message: e.to_string(),
    })
}

// --- slots ---

/// Query for the live preview. Every field may be missing while the user types.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    /// Kept raw so `duration=` or `duration=3x` still reach the partitioner.
    #[serde(default)]
    pub duration: String,
}

impl PreviewQuery {
    /// Minutes per slot; anything that is not an integer counts as zero.
    pub fn duration_minutes(&self) -> i64 {
        self.duration.trim().parse().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotIntervalDto {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotPreviewDto {
    pub slots: Vec<SlotIntervalDto>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlotBatchReq {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub duration: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlotReq {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub duration: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSlotReq {
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration: Option<u32>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityReq {
    pub is_available: bool,
}

/// `available=true` wins over `doctor_id`, which wins over `date`.
/// With no filter the caller's own slots are listed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSlotsQuery {
    pub doctor_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub available: Option<bool>,
}

impl ListSlotsQuery {
    pub fn into_query(self, caller_doctor_id: &str) -> SlotQuery {
        match (self.available, self.doctor_id, self.date) {
            (Some(true), _, date) => SlotQuery::Available { date },
            (_, Some(doctor_id), _) => SlotQuery::ByDoctor(doctor_id),
            (_, None, Some(date)) => SlotQuery::ByDate(date),
            _ => SlotQuery::ByDoctor(caller_doctor_id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotDto {
    pub id: Uuid,
    pub doctor_id: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub duration: u32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotConsistencyDto {
    pub slot_id: Uuid,
    pub is_available: bool,
    pub expected_available: Option<bool>,
    pub consistent: bool,
    pub double_booked: bool,
    pub appointment_count: usize,
    pub holding_appointments: Vec<Uuid>,
}

// --- appointments ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentReq {
    pub slot_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAppointmentReq {
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
    pub patient_email: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionReq {
    pub status: String,
}

/// `doctor_id` wins over `date`, which wins over `status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAppointmentsQuery {
    pub doctor_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
}

impl TryFrom<ListAppointmentsQuery> for AppointmentQuery {
    type Error = FieldError;

    fn try_from(q: ListAppointmentsQuery) -> Result<Self, Self::Error> {
        Ok(match (q.doctor_id, q.date, q.status) {
            (Some(doctor_id), _, _) => AppointmentQuery::ByDoctor(doctor_id),
            (None, Some(date), _) => AppointmentQuery::ByDate(date),
            (None, None, Some(status)) => AppointmentQuery::ByStatus(parse_status(&status)?),
            (None, None, None) => AppointmentQuery::All,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDto {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- reports ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCountsDto {
    pub total: usize,
    pub scheduled: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
    #[serde(rename = "no-show")]
    pub no_show: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyScheduleDto {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub appointments: Vec<AppointmentDto>,
    pub counts: StatusCountsDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecordDto {
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub appointments: Vec<AppointmentDto>,
    pub last_appointment_date: NaiveDate,
    pub last_appointment_time: String,
}

// Conversion implementations between REST DTOs and contract models

impl From<SlotInterval> for SlotIntervalDto {
    fn from(s: SlotInterval) -> Self {
        Self {
            start_time: s.start.to_string(),
            end_time: s.end.to_string(),
        }
    }
}

impl From<Vec<SlotInterval>> for SlotPreviewDto {
    fn from(slots: Vec<SlotInterval>) -> Self {
        Self {
            count: slots.len(),
            slots: slots.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<CreateSlotBatchReq> for SlotBatch {
    fn from(req: CreateSlotBatchReq) -> Self {
        Self {
            date: req.date,
            start_time: req.start_time,
            end_time: req.end_time,
            duration: req.duration,
        }
    }
}

impl TryFrom<CreateSlotReq> for NewSlot {
    type Error = FieldError;

    fn try_from(req: CreateSlotReq) -> Result<Self, Self::Error> {
        Ok(Self {
            date: req.date,
            start_time: parse_time("start_time", &req.start_time)?,
            end_time: parse_time("end_time", &req.end_time)?,
            duration: req.duration,
        })
    }
}

impl TryFrom<UpdateSlotReq> for SlotPatch {
    type Error = FieldError;

    fn try_from(req: UpdateSlotReq) -> Result<Self, Self::Error> {
        Ok(Self {
            date: req.date,
            start_time: parse_opt_time("start_time", req.start_time)?,
            end_time: parse_opt_time("end_time", req.end_time)?,
            duration: req.duration,
            is_available: req.is_available,
        })
    }
}

impl From<TimeSlot> for TimeSlotDto {
    fn from(s: TimeSlot) -> Self {
        Self {
            id: s.id,
            doctor_id: s.doctor_id,
            doctor_name: s.doctor_name,
            date: s.date,
            start_time: s.start_time.to_string(),
            end_time: s.end_time.to_string(),
            duration: s.duration,
            is_available: s.is_available,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

impl From<SlotConsistency> for SlotConsistencyDto {
    fn from(c: SlotConsistency) -> Self {
        Self {
            consistent: c.is_consistent(),
            double_booked: c.is_double_booked(),
            slot_id: c.slot_id,
            is_available: c.is_available,
            expected_available: c.expected_available,
            appointment_count: c.appointment_count,
            holding_appointments: c.holding,
        }
    }
}

impl From<BookAppointmentReq> for NewAppointment {
    fn from(req: BookAppointmentReq) -> Self {
        Self {
            slot_id: req.slot_id,
            patient_name: req.patient_name,
            patient_phone: req.patient_phone,
            patient_email: req.patient_email,
            notes: req.notes,
        }
    }
}

impl From<UpdateAppointmentReq> for AppointmentPatch {
    fn from(req: UpdateAppointmentReq) -> Self {
        Self {
            patient_name: req.patient_name,
            patient_phone: req.patient_phone,
            patient_email: req.patient_email,
            notes: req.notes,
        }
    }
}

impl From<Appointment> for AppointmentDto {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            slot_id: a.slot_id,
            patient_name: a.patient_name,
            patient_phone: a.patient_phone,
            patient_email: a.patient_email,
            date: a.date,
            start_time: a.start_time.to_string(),
            end_time: a.end_time.to_string(),
            doctor_id: a.doctor_id,
            doctor_name: a.doctor_name,
            status: a.status.to_string(),
            notes: a.notes,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

impl From<StatusCounts> for StatusCountsDto {
    fn from(c: StatusCounts) -> Self {
        Self {
            total: c.total,
            scheduled: c.scheduled,
            confirmed: c.confirmed,
            completed: c.completed,
            cancelled: c.cancelled,
            no_show: c.no_show,
        }
    }
}

impl From<DailySchedule> for DailyScheduleDto {
    fn from(d: DailySchedule) -> Self {
        Self {
            doctor_id: d.doctor_id,
            date: d.date,
            appointments: d.appointments.into_iter().map(Into::into).collect(),
            counts: d.counts.into(),
        }
    }
}

impl From<PatientRecord> for PatientRecordDto {
    fn from(p: PatientRecord) -> Self {
        Self {
            patient_name: p.patient_name,
            patient_phone: p.patient_phone,
            patient_email: p.patient_email,
            appointments: p.appointments.into_iter().map(Into::into).collect(),
            last_appointment_date: p.last_appointment_date,
            last_appointment_time: p.last_appointment_time.to_string(),
        }
    }
}
