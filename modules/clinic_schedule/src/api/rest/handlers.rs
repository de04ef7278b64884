use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use chrono::NaiveDate;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::rest::dto::{
    parse_status, AppointmentDto, BookAppointmentReq, CreateSlotBatchReq, CreateSlotReq,
    DailyScheduleDto, FieldError, ListAppointmentsQuery, ListSlotsQuery, PatientRecordDto,
    PreviewQuery, SetAvailabilityReq, SlotConsistencyDto, SlotPreviewDto, TimeSlotDto,
    TransitionReq, UpdateAppointmentReq, UpdateSlotReq,
};
use crate::api::rest::error::{invalid_field, map_domain_error};
use crate::api::rest::identity::CurrentDoctor;
use crate::api::rest::problem::ProblemResponse;
use crate::contract::model::{AppointmentQuery, NewSlot, SlotPatch};
use crate::domain::service::Service;

fn field_problem(e: FieldError, uri: &Uri) -> ProblemResponse {
    invalid_field(e.field, e.message, uri.path())
}

// --- slots ---

/// Partition a window without storing anything
pub async fn preview_slots(
    Extension(svc): Extension<Arc<Service>>,
    Query(q): Query<PreviewQuery>,
) -> Json<SlotPreviewDto> {
    Json(svc.preview_slots(&q.start_time, &q.end_time, q.duration_minutes()).into())
}

/// Partition a window and store one slot per piece
pub async fn create_slot_batch(
    Extension(svc): Extension<Arc<Service>>,
    CurrentDoctor(actor): CurrentDoctor,
    uri: Uri,
    Json(req): Json<CreateSlotBatchReq>,
) -> Result<(StatusCode, Json<Vec<TimeSlotDto>>), ProblemResponse> {
    info!("Creating slot batch: {:?}", req);

    match svc.create_slot_batch(&actor, req.into()).await {
        Ok(slots) => Ok((
            StatusCode::CREATED,
            Json(slots.into_iter().map(TimeSlotDto::from).collect()),
        )),
        Err(e) => {
            error!("Failed to create slot batch: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn create_slot(
    Extension(svc): Extension<Arc<Service>>,
    CurrentDoctor(actor): CurrentDoctor,
    uri: Uri,
    Json(req): Json<CreateSlotReq>,
) -> Result<(StatusCode, Json<TimeSlotDto>), ProblemResponse> {
    info!("Creating slot: {:?}", req);

    let slot = NewSlot::try_from(req).map_err(|e| field_problem(e, &uri))?;
    match svc.create_slot(&actor, slot).await {
        Ok(slot) => Ok((StatusCode::CREATED, Json(TimeSlotDto::from(slot)))),
        Err(e) => {
            error!("Failed to create slot: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn list_slots(
    Extension(svc): Extension<Arc<Service>>,
    CurrentDoctor(actor): CurrentDoctor,
    uri: Uri,
    Query(q): Query<ListSlotsQuery>,
) -> Result<Json<Vec<TimeSlotDto>>, ProblemResponse> {
    let query = q.into_query(&actor.doctor_id);
    info!("Listing slots with query: {:?}", query);

    match svc.list_slots(query).await {
        Ok(slots) => Ok(Json(slots.into_iter().map(TimeSlotDto::from).collect())),
        Err(e) => {
            error!("Failed to list slots: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn get_slot(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<TimeSlotDto>, ProblemResponse> {
    info!("Getting slot with id: {}", id);

    match svc.get_slot(id).await {
        Ok(slot) => Ok(Json(TimeSlotDto::from(slot))),
        Err(e) => {
            error!("Failed to get slot {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn update_slot(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req): Json<UpdateSlotReq>,
) -> Result<Json<TimeSlotDto>, ProblemResponse> {
    info!("Updating slot {} with: {:?}", id, req);

    let patch = SlotPatch::try_from(req).map_err(|e| field_problem(e, &uri))?;
    match svc.update_slot(id, patch).await {
        Ok(slot) => Ok(Json(TimeSlotDto::from(slot))),
        Err(e) => {
            error!("Failed to update slot {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Manual availability toggle
pub async fn set_slot_availability(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req): Json<SetAvailabilityReq>,
) -> Result<Json<TimeSlotDto>, ProblemResponse> {
    info!("Setting slot {} availability to {}", id, req.is_available);

    match svc.set_slot_availability(id, req.is_available).await {
        Ok(slot) => Ok(Json(TimeSlotDto::from(slot))),
        Err(e) => {
            error!("Failed to set availability of slot {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn delete_slot(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    info!("Deleting slot: {}", id);

    match svc.delete_slot(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete slot {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn check_slot_consistency(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<SlotConsistencyDto>, ProblemResponse> {
    match svc.check_slot_consistency(id).await {
        Ok(report) => Ok(Json(report.into())),
        Err(e) => {
            error!("Failed to check slot {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn reconcile_slot(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<SlotConsistencyDto>, ProblemResponse> {
    info!("Reconciling slot: {}", id);

    match svc.reconcile_slot(id).await {
        Ok(report) => Ok(Json(report.into())),
        Err(e) => {
            error!("Failed to reconcile slot {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

// --- appointments ---

pub async fn book_appointment(
    Extension(svc): Extension<Arc<Service>>,
    CurrentDoctor(actor): CurrentDoctor,
    uri: Uri,
    Json(req): Json<BookAppointmentReq>,
) -> Result<(StatusCode, Json<AppointmentDto>), ProblemResponse> {
    info!("Booking slot {} for doctor {}", req.slot_id, actor.doctor_id);

    match svc.book_appointment(&actor, req.into()).await {
        Ok(appointment) => Ok((StatusCode::CREATED, Json(AppointmentDto::from(appointment)))),
        Err(e) => {
            error!("Failed to book appointment: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn list_appointments(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    Query(q): Query<ListAppointmentsQuery>,
) -> Result<Json<Vec<AppointmentDto>>, ProblemResponse> {
    let query = AppointmentQuery::try_from(q).map_err(|e| field_problem(e, &uri))?;
    info!("Listing appointments with query: {:?}", query);

    match svc.list_appointments(query).await {
        Ok(list) => Ok(Json(list.into_iter().map(AppointmentDto::from).collect())),
        Err(e) => {
            error!("Failed to list appointments: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn get_appointment(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<AppointmentDto>, ProblemResponse> {
    info!("Getting appointment with id: {}", id);

    match svc.get_appointment(id).await {
        Ok(appointment) => Ok(Json(AppointmentDto::from(appointment))),
        Err(e) => {
            error!("Failed to get appointment {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn update_appointment(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req): Json<UpdateAppointmentReq>,
) -> Result<Json<AppointmentDto>, ProblemResponse> {
    info!("Updating appointment {}", id);

    match svc.update_appointment(id, req.into()).await {
        Ok(appointment) => Ok(Json(AppointmentDto::from(appointment))),
        Err(e) => {
            error!("Failed to update appointment {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Change status; cancelled and no-show free the slot
pub async fn transition_appointment(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req): Json<TransitionReq>,
) -> Result<Json<AppointmentDto>, ProblemResponse> {
    info!("Moving appointment {} to {}", id, req.status);

    let status = parse_status(&req.status).map_err(|e| field_problem(e, &uri))?;
    match svc.transition_appointment(id, status).await {
        Ok(appointment) => Ok(Json(AppointmentDto::from(appointment))),
        Err(e) => {
            error!("Failed to transition appointment {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn delete_appointment(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    info!("Deleting appointment: {}", id);

    match svc.delete_appointment(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete appointment {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

// --- reports ---

/// The caller's appointments on one day
pub async fn daily_schedule(
    Extension(svc): Extension<Arc<Service>>,
    CurrentDoctor(actor): CurrentDoctor,
    Path(date): Path<NaiveDate>,
    uri: Uri,
) -> Result<Json<DailyScheduleDto>, ProblemResponse> {
    match svc.daily_schedule(&actor.doctor_id, date).await {
        Ok(day) => Ok(Json(day.into())),
        Err(e) => {
            error!("Failed to build schedule for {}: {}", date, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// The caller's patients, grouped by phone
pub async fn patient_roster(
    Extension(svc): Extension<Arc<Service>>,
    CurrentDoctor(actor): CurrentDoctor,
    uri: Uri,
) -> Result<Json<Vec<PatientRecordDto>>, ProblemResponse> {
    match svc.patient_roster(&actor.doctor_id).await {
        Ok(roster) => Ok(Json(roster.into_iter().map(PatientRecordDto::from).collect())),
        Err(e) => {
            error!("Failed to build patient roster: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}
