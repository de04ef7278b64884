use axum::http::StatusCode;

use crate::api::rest::problem::{Problem, ProblemResponse, ValidationError};
use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.example.com/{}", code))
        .with_code(code)
        .with_instance(instance);

    // Attach the current span id so the response can be matched with logs
    let problem = if let Some(id) = tracing::Span::current().id() {
        problem.with_trace_id(id.into_u64().to_string())
    } else {
        problem
    };

    ProblemResponse(problem)
}

/// 400 for request payloads that parse as JSON but carry unusable values.
pub fn invalid_field(field: &str, detail: impl Into<String>, instance: &str) -> ProblemResponse {
    let detail = detail.into();
    let mut resp = from_parts(
        StatusCode::BAD_REQUEST,
        "SCHEDULE_VALIDATION",
        "Validation error",
        format!("{field}: {detail}"),
        instance,
    );
    resp.0 = resp.0.with_errors(vec![ValidationError {
        detail,
        pointer: format!("/{field}"),
    }]);
    resp
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::SlotNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "SCHEDULE_SLOT_NOT_FOUND",
            "Slot not found",
            format!("Slot with id {} was not found", id),
            instance,
        ),
        DomainError::AppointmentNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "SCHEDULE_APPOINTMENT_NOT_FOUND",
            "Appointment not found",
            format!("Appointment with id {} was not found", id),
            instance,
        ),
        DomainError::SlotUnavailable { id } => from_parts(
            StatusCode::CONFLICT,
            "SCHEDULE_SLOT_UNAVAILABLE",
            "Slot unavailable",
            format!("Slot {} is already booked", id),
            instance,
        ),
        DomainError::InvalidTimeWindow { .. } | DomainError::EmptyPartition { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "SCHEDULE_INVALID_WINDOW",
            "Invalid time window",
            e.to_string(),
            instance,
        ),
        DomainError::TooManySlots { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "SCHEDULE_TOO_MANY_SLOTS",
            "Too many slots",
            e.to_string(),
            instance,
        ),
        DomainError::Validation { field, message } => invalid_field(field, message.clone(), instance),
        DomainError::InvalidTransition { .. } => from_parts(
            StatusCode::CONFLICT,
            "SCHEDULE_INVALID_TRANSITION",
            "Invalid status transition",
            e.to_string(),
            instance,
        ),
        DomainError::BatchIncomplete { created, failed, .. } => {
            tracing::error!(error = ?e, "Slot batch incomplete");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "SCHEDULE_BATCH_INCOMPLETE",
                "Batch incomplete",
                format!(
                    "{} slots were created and kept, {} could not be stored",
                    created, failed
                ),
                instance,
            )
        }
        DomainError::PartialWrite {
            appointment_id,
            slot_id,
            ..
        } => {
            tracing::error!(error = ?e, "Partial write");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "SCHEDULE_PARTIAL_WRITE",
                "Partial write",
                format!(
                    "Appointment {} was saved but slot {} could not be updated; reconcile the slot",
                    appointment_id, slot_id
                ),
                instance,
            )
        }
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_DB",
                "Internal error",
                "An internal database error occurred",
                instance,
            )
        }
    }
}
