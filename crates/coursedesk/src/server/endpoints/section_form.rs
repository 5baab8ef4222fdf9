//! API endpoints backing the "add section" form.
//!
//! A UI opens a form for a course, pushes field edits as the user types,
//! and submits. Every response carries the recomputed budget so the UI can
//! render the remaining minutes and the submit control without its own logic.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::catalog::{ApiError, Course, EntityId, Section, SectionsApi};
use crate::section_form::{submit_section, DurationBudget, SectionDraft, SubmitOutcome};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// Query parameters for the budget endpoint.
#[derive(Debug, Deserialize)]
pub struct BudgetQueryParams {
    /// Proposed duration for a new section, in minutes
    #[serde(default)]
    pub candidate: Option<i64>,
}

/// Fetches a course and its sections concurrently.
async fn fetch_course_and_sections(
    state: &AppState,
    course_id: &EntityId,
) -> Result<(Course, Vec<Section>), ApiError> {
    futures::try_join!(
        state.client.get_course(course_id),
        state.client.list_sections(course_id)
    )
}

fn form_not_found(form_id: &str) -> Response {
    warn!("Section form not found: {}", form_id);
    ApiErrorType::from((
        StatusCode::NOT_FOUND,
        "Section form not found",
        Some(format!("No open section form with ID: {}", form_id)),
    ))
    .into_response()
}

/// GET /courses/:course_id/budget
///
/// Returns the course's duration budget, evaluated for `candidate` if given.
pub async fn get_budget(
    Path(course_id): Path<String>,
    State(s): State<Arc<AppState>>,
    Query(params): Query<BudgetQueryParams>,
) -> Response {
    info!(
        "GET /courses/{}/budget (candidate={:?})",
        course_id, params.candidate
    );

    let course_id = EntityId::from(course_id.as_str());
    match fetch_course_and_sections(&s, &course_id).await {
        Ok((course, sections)) => {
            let budget =
                DurationBudget::compute(course.duration_minutes(), &sections, params.candidate);
            (
                StatusCode::OK,
                Json(json!({
                    "course_id": course.id,
                    "section_count": sections.len(),
                    "is_valid": budget.is_valid(),
                    "error": budget.error().map(ToString::to_string),
                    "budget": budget,
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to compute budget for course {}: {}", course_id, e);
            ApiErrorType::from(e).into_response()
        }
    }
}

/// POST /courses/:course_id/section_form
///
/// Opens a new section form against the course's current sections.
pub async fn post_open_form(
    Path(course_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("POST /courses/{}/section_form", course_id);

    let course_id = EntityId::from(course_id.as_str());
    let (course, sections) = match fetch_course_and_sections(&s, &course_id).await {
        Ok(found) => found,
        Err(e) => {
            error!("Failed to open section form for course {}: {}", course_id, e);
            return ApiErrorType::from(e).into_response();
        }
    };

    let (form_id, form) = s.register_form(course_id);
    let view = {
        let mut form = form.lock().await;
        form.open_for_course(&course, sections);
        form.view()
    };

    (
        StatusCode::CREATED,
        Json(json!({ "form_id": form_id, "form": view })),
    )
        .into_response()
}

/// GET /section_form/:form_id
pub async fn get_form(Path(form_id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    match s.get_form(&form_id) {
        Some(form) => (StatusCode::OK, Json(form.lock().await.view())).into_response(),
        None => form_not_found(&form_id),
    }
}

/// PUT /section_form/:form_id
///
/// Replaces the draft with the submitted field values and returns the
/// recomputed form state.
pub async fn put_form(
    Path(form_id): Path<String>,
    State(s): State<Arc<AppState>>,
    Json(draft): Json<SectionDraft>,
) -> Response {
    let Some(form) = s.get_form(&form_id) else {
        return form_not_found(&form_id);
    };

    let mut form = form.lock().await;
    if let Err(e) = form.apply_draft(draft) {
        return ApiErrorType::from(e).into_response();
    }

    (StatusCode::OK, Json(form.view())).into_response()
}

/// POST /section_form/:form_id/submit
///
/// Creates the section. On success the form is closed and the response
/// includes the refreshed section list for the course.
pub async fn post_submit_form(
    Path(form_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("POST /section_form/{}/submit", form_id);

    let Some(form) = s.get_form(&form_id) else {
        return form_not_found(&form_id);
    };
    let course_id = form.lock().await.course_id().clone();

    match submit_section(&form, &s.client).await {
        Ok(SubmitOutcome::Created(section)) => {
            s.remove_form(&form_id);

            let sections = match s.client.list_sections(&course_id).await {
                Ok(sections) => Some(sections),
                Err(e) => {
                    warn!(
                        "Section created but refreshing course {} failed: {}",
                        course_id, e
                    );
                    None
                }
            };

            (
                StatusCode::CREATED,
                Json(json!({ "section": section, "sections": sections })),
            )
                .into_response()
        }
        Ok(SubmitOutcome::Failed { message }) => ApiErrorType::from((
            StatusCode::BAD_GATEWAY,
            "Section service rejected the request",
            Some(message),
        ))
        .into_response(),
        Ok(SubmitOutcome::Ignored) => ApiErrorType::from((
            StatusCode::CONFLICT,
            "Section form was closed before the section service answered",
            None,
        ))
        .into_response(),
        Err(e) => {
            if e.is_validation() {
                info!("Section form {} failed validation: {}", form_id, e);
            } else {
                warn!("Section form {} cannot submit: {}", form_id, e);
            }
            ApiErrorType::from(e).into_response()
        }
    }
}

/// DELETE /section_form/:form_id
pub async fn delete_form(
    Path(form_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("DELETE /section_form/{}", form_id);

    match s.remove_form(&form_id) {
        Some(form) => {
            form.lock().await.close();
            StatusCode::NO_CONTENT.into_response()
        }
        None => form_not_found(&form_id),
    }
}
