//! Caller identity for REST handlers.
//!
//! Authentication happens upstream; the identity provider forwards the
//! authenticated doctor in request headers and this module trusts them.

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap, StatusCode};

use crate::api::rest::error::from_parts;
use crate::api::rest::problem::ProblemResponse;
use crate::contract::model::Actor;

pub const DOCTOR_ID_HEADER: &str = "x-doctor-id";
pub const DOCTOR_NAME_HEADER: &str = "x-doctor-name";

/// Extractor for the authenticated doctor.
#[derive(Debug, Clone)]
pub struct CurrentDoctor(pub Actor);

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

impl<S> FromRequestParts<S> for CurrentDoctor
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(doctor_id) = header_value(&parts.headers, DOCTOR_ID_HEADER) else {
            return Err(from_parts(
                StatusCode::UNAUTHORIZED,
                "SCHEDULE_UNAUTHENTICATED",
                "Unauthenticated",
                format!("Missing {} header", DOCTOR_ID_HEADER),
                parts.uri.path(),
            ));
        };
        let doctor_name =
            header_value(&parts.headers, DOCTOR_NAME_HEADER).unwrap_or_else(|| doctor_id.clone());

        Ok(CurrentDoctor(Actor {
            doctor_id,
            doctor_name,
        }))
    }
}
