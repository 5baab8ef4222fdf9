use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::catalog::ApiError;
use crate::section_form::SectionFormError;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiErrorType {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    context: Option<String>,
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, error, context): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            error: error.to_string(),
            context,
        }
    }
}

impl From<SectionFormError> for ApiErrorType {
    fn from(err: SectionFormError) -> Self {
        let (status, error) = match &err {
            SectionFormError::Duration(_) | SectionFormError::TitleRequired => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Section failed validation")
            }
            SectionFormError::FormClosed => (StatusCode::CONFLICT, "Section form is closed"),
            SectionFormError::SubmissionInFlight => {
                (StatusCode::CONFLICT, "Section is already being created")
            }
        };

        Self::from((status, error, Some(err.to_string())))
    }
}

impl From<ApiError> for ApiErrorType {
    fn from(err: ApiError) -> Self {
        let status = if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::BAD_GATEWAY
        };

        Self::from((status, "Catalog service request failed", Some(err.user_message())))
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
