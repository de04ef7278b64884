use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::{Extension, Router};

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Mount the clinic_schedule endpoints on `router`.
pub fn register_routes(router: Router, service: Arc<Service>) -> anyhow::Result<Router> {
    let routes = Router::new()
        // GET /slots/preview - Partition a window without storing it
        .route("/slots/preview", get(handlers::preview_slots))
        // POST /slots/batch - Partition a window and store the slots
        .route("/slots/batch", post(handlers::create_slot_batch))
        .route(
            "/slots",
            get(handlers::list_slots).post(handlers::create_slot),
        )
        .route(
            "/slots/{id}",
            get(handlers::get_slot)
                .patch(handlers::update_slot)
                .delete(handlers::delete_slot),
        )
        .route(
            "/slots/{id}/availability",
            put(handlers::set_slot_availability),
        )
        .route(
            "/slots/{id}/consistency",
            get(handlers::check_slot_consistency),
        )
        .route("/slots/{id}/reconcile", post(handlers::reconcile_slot))
        .route(
            "/appointments",
            get(handlers::list_appointments).post(handlers::book_appointment),
        )
        .route(
            "/appointments/{id}",
            get(handlers::get_appointment)
                .patch(handlers::update_appointment)
                .delete(handlers::delete_appointment),
        )
        .route(
            "/appointments/{id}/status",
            put(handlers::transition_appointment),
        )
        // GET /schedule/{date} - The caller's day
        .route("/schedule/{date}", get(handlers::daily_schedule))
        // GET /patients - The caller's patients
        .route("/patients", get(handlers::patient_roster))
        .layer(Extension(service));

    Ok(router.merge(routes))
}
