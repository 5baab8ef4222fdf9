//! HTTP client for the course and section services.
//!
//! Three calls feed section planning:
//! 1. GET  /Courses/{id}                  course total duration
//! 2. GET  /Sections/course/{courseId}    sections already committed
//! 3. POST /Sections/course/{courseId}    create a new section
//!
//! Every call is one-shot: no retry, no cancellation. Response envelopes are
//! normalized here so callers only ever see typed values.

use super::error::ApiError;
use super::types::{
    Course, CreateSectionRequest, EntityId, ItemEnvelope, ListEnvelope, Section,
    ServiceErrorBody,
};
use chrono::Utc;
use rand::Rng;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

const COURSES_PATH: &str = "Courses";
const SECTIONS_PATH: &str = "Sections";
const SECTIONS_BY_COURSE_PATH: &str = "course";

/// The collaborators section planning depends on.
pub trait SectionsApi {
    /// Fetches a single course.
    fn get_course(
        &self,
        course_id: &EntityId,
    ) -> impl Future<Output = Result<Course, ApiError>> + Send;

    /// Lists the sections already attached to a course.
    fn list_sections(
        &self,
        course_id: &EntityId,
    ) -> impl Future<Output = Result<Vec<Section>, ApiError>> + Send;

    /// Creates a section under a course, returning the created section.
    fn create_section(
        &self,
        course_id: &EntityId,
        request: &CreateSectionRequest,
    ) -> impl Future<Output = Result<Section, ApiError>> + Send;
}

/// Configuration for the catalog client.
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// Base URL of the course service
    pub course_base_url: String,
    /// Base URL of the section service
    pub section_base_url: String,
    /// Bearer token sent with every request, if any
    pub api_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            course_base_url: "http://localhost:5001".to_string(),
            section_base_url: "http://localhost:5002".to_string(),
            api_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("coursedesk/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Client for the course and section REST services.
#[derive(Debug, Clone)]
pub struct CourseApiClient {
    client: Client,
    config: CatalogClientConfig,
}

impl CourseApiClient {
    /// Creates a new client with default configuration.
    pub fn new() -> Result<Self, ApiError> {
        Self::with_config(CatalogClientConfig::default())
    }

    /// Creates a new client with custom configuration.
    pub fn with_config(config: CatalogClientConfig) -> Result<Self, ApiError> {
        // Fail on unusable base URLs up front rather than on first request
        Url::parse(&config.course_base_url)?;
        Url::parse(&config.section_base_url)?;

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    fn course_url(&self, course_id: &EntityId) -> Result<Url, ApiError> {
        endpoint(
            &self.config.course_base_url,
            &[COURSES_PATH, &course_id.to_string()],
        )
    }

    fn sections_url(&self, course_id: &EntityId) -> Result<Url, ApiError> {
        endpoint(
            &self.config.section_base_url,
            &[SECTIONS_PATH, SECTIONS_BY_COURSE_PATH, &course_id.to_string()],
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends a request and decodes a successful body as `T`.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        request_id: &str,
    ) -> Result<T, ApiError> {
        let start = Instant::now();
        let response = self.authorize(request).send().await.map_err(|e| {
            warn!(
                request_id = %request_id,
                error = %e,
                "Request did not complete"
            );
            ApiError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        debug!(
            request_id = %request_id,
            status = status.as_u16(),
            body_len = body.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Received response"
        );

        if !status.is_success() {
            let err = service_error(status, &body);
            warn!(
                request_id = %request_id,
                status = status.as_u16(),
                error = %err,
                "Service rejected request"
            );
            return Err(err);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl SectionsApi for CourseApiClient {
    async fn get_course(&self, course_id: &EntityId) -> Result<Course, ApiError> {
        let request_id = new_request_id();
        let url = self.course_url(course_id)?;
        info!(
            request_id = %request_id,
            url = %url,
            "Fetching course"
        );

        let envelope: ItemEnvelope<Course> =
            self.execute(self.client.get(url), &request_id).await?;
        Ok(envelope.into_inner())
    }

    async fn list_sections(&self, course_id: &EntityId) -> Result<Vec<Section>, ApiError> {
        let request_id = new_request_id();
        let url = self.sections_url(course_id)?;
        info!(
            request_id = %request_id,
            url = %url,
            "Listing sections"
        );

        let envelope: ListEnvelope<Section> =
            self.execute(self.client.get(url), &request_id).await?;
        let sections = envelope.into_vec();

        debug!(
            request_id = %request_id,
            count = sections.len(),
            "Sections listed"
        );
        Ok(sections)
    }

    async fn create_section(
        &self,
        course_id: &EntityId,
        request: &CreateSectionRequest,
    ) -> Result<Section, ApiError> {
        let request_id = new_request_id();
        let url = self.sections_url(course_id)?;
        info!(
            request_id = %request_id,
            url = %url,
            minutes = request.estimated_duration_minutes,
            "Creating section"
        );

        let envelope: ItemEnvelope<Section> = self
            .execute(self.client.post(url).json(request), &request_id)
            .await?;
        let section = envelope.into_inner();

        info!(
            request_id = %request_id,
            section_id = %section.id,
            "Section created"
        );
        Ok(section)
    }
}

/// Joins path segments onto a base URL, percent-encoding each segment.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| ApiError::UrlError {
            message: format!("{} cannot be used as a base URL", base),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Builds the error for a non-success response, preferring the message the
/// service put in its body.
fn service_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ServiceErrorBody>(body)
        .ok()
        .and_then(ServiceErrorBody::into_message)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("Request failed with status {}", status));

    ApiError::Service { status, message }
}

/// Returns an ID like `192a4c3f1b2-9f04c2d1e8a7b365`: the current Unix time
/// in milliseconds followed by 64 random bits, both in hex.
///
/// Tags the log lines of one backend call, and keys open section forms.
pub(crate) fn new_request_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let nonce: u64 = rand::thread_rng().gen();
    format!("{:x}-{:016x}", millis, nonce)
}
