use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::server::endpoints::{section_form, status};
use crate::types::AppState;

mod endpoints;
pub mod types;

/// Builds the service's routes: `/health`, the per-course budget query and
/// form opening under `/courses`, and the open-form lifecycle under
/// `/section_form/:form_id`.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let course_router = Router::new()
        .route("/:course_id/budget", get(section_form::get_budget))
        .route(
            "/:course_id/section_form",
            axum::routing::post(section_form::post_open_form),
        );

    let form_router = Router::new()
        .route(
            "/:form_id",
            get(section_form::get_form)
                .put(section_form::put_form)
                .delete(section_form::delete_form),
        )
        .route(
            "/:form_id/submit",
            axum::routing::post(section_form::post_submit_form),
        );

    Router::new()
        .route("/health", get(status::get_health))
        .nest("/courses", course_router)
        .nest("/section_form", form_router)
        .with_state(app_state)
}
