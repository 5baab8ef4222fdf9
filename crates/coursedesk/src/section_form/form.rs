//! The "add section" form.
//!
//! A form is either closed or open. While open it holds a draft section and
//! the budget for the draft's duration, recomputed on every edit. Submission
//! is split in two halves so the creation request runs without the form
//! being locked:
//!
//! 1. `begin_submit` re-validates and hands out a `SubmitTicket`
//! 2. the caller sends the ticket's request to the section service
//! 3. `finish_submit` applies the response, unless the form was closed or
//!    reopened in the meantime, in which case the response is dropped

use super::budget::DurationBudget;
use super::error::SectionFormError;
use crate::catalog::{ApiError, Course, CreateSectionRequest, EntityId, Section, SectionsApi};
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Duration pre-filled into a freshly opened form.
pub const DEFAULT_SECTION_MINUTES: i64 = 60;

/// Values the user types into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDraft {
    #[serde(rename = "sectionTitle", default)]
    pub section_title: String,

    #[serde(rename = "sectionDescription", default)]
    pub section_description: String,

    /// Accepts a number, a numeric string, or a blank string (no value)
    #[serde(
        rename = "estimatedDurationMinutes",
        default,
        deserialize_with = "blank_as_none"
    )]
    pub estimated_duration_minutes: Option<i64>,
}

/// Form inputs post their raw text, so an emptied duration field arrives
/// as `""` rather than `null`.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawMinutes {
        Number(i64),
        Text(String),
    }

    match Option::<RawMinutes>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawMinutes::Number(minutes)) => Ok(Some(minutes)),
        Some(RawMinutes::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse().map(Some).map_err(|_| {
                de::Error::custom(format!("invalid duration in minutes: {:?}", text))
            })
        }
    }
}

/// How the submit control should be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmitControl {
    /// Not rendered: form closed, or the course has no minutes left
    Hidden,
    /// A creation request is outstanding
    Busy,
    /// Rendered, but field validation blocks it
    Blocked { error: String },
    Enabled,
}

/// Proof that a submission passed validation, tied to one form session.
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    session: u64,
    pub course_id: EntityId,
    pub request: CreateSectionRequest,
}

/// Result of applying the section service's response to the form.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Section created; the form is closed and the caller should refresh
    /// its section list
    Created(Section),
    /// The service rejected the request; the form stays open and populated
    Failed { message: String },
    /// The form was closed or reopened while the request was in flight
    Ignored,
}

/// Serializable snapshot of a form for the UI.
#[derive(Debug, Clone, Serialize)]
pub struct SectionFormView {
    pub course_id: EntityId,
    pub open: bool,
    pub session: u64,
    pub draft: SectionDraft,
    pub budget: DurationBudget,
    pub is_valid: bool,
    pub error: Option<String>,
    pub submit_control: SubmitControl,
    pub opened_at: Option<String>,
}

/// Form state for adding one section to a course.
#[derive(Debug)]
pub struct SectionDurationForm {
    course_id: EntityId,
    default_minutes: i64,
    course_duration_minutes: i64,
    existing_sections: Vec<Section>,
    draft: SectionDraft,
    budget: DurationBudget,
    session: u64,
    open: bool,
    submitting: bool,
    opened_at: Option<DateTime<Utc>>,
}

impl SectionDurationForm {
    /// Creates a closed form for `course_id`.
    pub fn new(course_id: EntityId) -> Self {
        Self::with_default_minutes(course_id, DEFAULT_SECTION_MINUTES)
    }

    /// Creates a closed form that pre-fills `default_minutes` when opened.
    pub fn with_default_minutes(course_id: EntityId, default_minutes: i64) -> Self {
        Self {
            course_id,
            default_minutes,
            course_duration_minutes: 0,
            existing_sections: Vec::new(),
            draft: Self::blank_draft(default_minutes),
            budget: DurationBudget::unrestricted_default(default_minutes),
            session: 0,
            open: false,
            submitting: false,
            opened_at: None,
        }
    }

    fn blank_draft(default_minutes: i64) -> SectionDraft {
        SectionDraft {
            estimated_duration_minutes: Some(default_minutes),
            ..SectionDraft::default()
        }
    }

    /// Opens the form against a course total and the sections it already has.
    ///
    /// Opening always starts a new session with a fresh draft, even if the
    /// form was already open.
    pub fn open(&mut self, course_duration_minutes: i64, existing_sections: Vec<Section>) {
        self.course_duration_minutes = course_duration_minutes.max(0);
        self.existing_sections = existing_sections;
        self.draft = Self::blank_draft(self.default_minutes);
        self.budget = DurationBudget::compute(
            self.course_duration_minutes,
            &self.existing_sections,
            self.draft.estimated_duration_minutes,
        );
        self.session += 1;
        self.open = true;
        self.submitting = false;
        self.opened_at = Some(Utc::now());

        info!(
            course_id = %self.course_id,
            session = self.session,
            total_minutes = self.budget.course_duration_minutes,
            used_minutes = self.budget.used_minutes,
            "Section form opened"
        );
    }

    /// Opens the form using the course's own `durationHours`.
    pub fn open_for_course(&mut self, course: &Course, existing_sections: Vec<Section>) {
        self.open(course.duration_minutes(), existing_sections);
    }

    /// Closes the form and resets it to the valid default state.
    pub fn close(&mut self) {
        if self.open {
            debug!(course_id = %self.course_id, session = self.session, "Section form closed");
        }
        self.open = false;
        self.submitting = false;
        self.course_duration_minutes = 0;
        self.existing_sections.clear();
        self.draft = Self::blank_draft(self.default_minutes);
        self.budget = DurationBudget::unrestricted_default(self.default_minutes);
        self.opened_at = None;
    }

    fn ensure_open(&self) -> Result<(), SectionFormError> {
        if self.open {
            Ok(())
        } else {
            Err(SectionFormError::FormClosed)
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), SectionFormError> {
        self.ensure_open()?;
        self.draft.section_title = title.into();
        Ok(())
    }

    pub fn set_description(
        &mut self,
        description: impl Into<String>,
    ) -> Result<(), SectionFormError> {
        self.ensure_open()?;
        self.draft.section_description = description.into();
        Ok(())
    }

    /// Updates the candidate duration and recomputes the budget.
    pub fn set_duration(
        &mut self,
        minutes: Option<i64>,
    ) -> Result<&DurationBudget, SectionFormError> {
        self.ensure_open()?;
        self.draft.estimated_duration_minutes = minutes;
        self.budget = self.budget.with_candidate(minutes);
        Ok(&self.budget)
    }

    /// Replaces every draft field at once.
    pub fn apply_draft(&mut self, draft: SectionDraft) -> Result<&DurationBudget, SectionFormError> {
        self.set_title(draft.section_title)?;
        self.set_description(draft.section_description)?;
        self.set_duration(draft.estimated_duration_minutes)
    }

    pub fn course_id(&self) -> &EntityId {
        &self.course_id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn draft(&self) -> &SectionDraft {
        &self.draft
    }

    pub fn budget(&self) -> &DurationBudget {
        &self.budget
    }

    pub fn existing_sections(&self) -> &[Section] {
        &self.existing_sections
    }

    /// How the submit control should currently be rendered.
    pub fn submit_control(&self) -> SubmitControl {
        if !self.open {
            return SubmitControl::Hidden;
        }
        if self.submitting {
            return SubmitControl::Busy;
        }
        if let Some(err) = self.budget.error() {
            if self.budget.is_exhausted() {
                return SubmitControl::Hidden;
            }
            return SubmitControl::Blocked {
                error: err.to_string(),
            };
        }
        if self.draft.section_title.trim().is_empty() {
            return SubmitControl::Blocked {
                error: SectionFormError::TitleRequired.to_string(),
            };
        }
        SubmitControl::Enabled
    }

    /// Re-validates the draft and marks the form as submitting.
    ///
    /// Nothing returned as an error here has touched the network.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, SectionFormError> {
        self.ensure_open()?;
        if self.submitting {
            return Err(SectionFormError::SubmissionInFlight);
        }

        // The budget is cheap; recompute instead of trusting the cached verdict
        let budget = DurationBudget::compute(
            self.course_duration_minutes,
            &self.existing_sections,
            self.draft.estimated_duration_minutes,
        );
        if let Err(err) = budget.check() {
            warn!(
                course_id = %self.course_id,
                session = self.session,
                error = %err,
                "Section submission rejected locally"
            );
            self.budget = budget;
            return Err(err.into());
        }

        let title = self.draft.section_title.trim();
        if title.is_empty() {
            return Err(SectionFormError::TitleRequired);
        }

        let request = CreateSectionRequest {
            section_title: title.to_string(),
            section_description: self.draft.section_description.trim().to_string(),
            estimated_duration_minutes: budget.candidate_minutes.unwrap_or_default(),
        };

        self.budget = budget;
        self.submitting = true;

        Ok(SubmitTicket {
            session: self.session,
            course_id: self.course_id.clone(),
            request,
        })
    }

    /// Applies the section service's response to a submission.
    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<Section, ApiError>,
    ) -> SubmitOutcome {
        if !self.open || !self.submitting || ticket.session != self.session {
            debug!(
                course_id = %self.course_id,
                ticket_session = ticket.session,
                session = self.session,
                "Dropping response for a stale form session"
            );
            return SubmitOutcome::Ignored;
        }

        self.submitting = false;

        match result {
            Ok(section) => {
                info!(
                    course_id = %self.course_id,
                    section_id = %section.id,
                    minutes = ticket.request.estimated_duration_minutes,
                    "Section created, closing form"
                );
                self.close();
                SubmitOutcome::Created(section)
            }
            Err(err) => {
                warn!(
                    course_id = %self.course_id,
                    error = %err,
                    "Section creation failed"
                );
                SubmitOutcome::Failed {
                    message: err.user_message(),
                }
            }
        }
    }

    pub fn view(&self) -> SectionFormView {
        SectionFormView {
            course_id: self.course_id.clone(),
            open: self.open,
            session: self.session,
            draft: self.draft.clone(),
            budget: self.budget.clone(),
            is_valid: self.budget.is_valid(),
            error: self.budget.error().map(ToString::to_string),
            submit_control: self.submit_control(),
            opened_at: self.opened_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Submits the form's draft through `api`.
///
/// The form lock is released while the creation request is in flight, and
/// the request is attempted exactly once.
pub async fn submit_section<A: SectionsApi>(
    form: &Mutex<SectionDurationForm>,
    api: &A,
) -> Result<SubmitOutcome, SectionFormError> {
    let ticket = form.lock().await.begin_submit()?;

    let result = api.create_section(&ticket.course_id, &ticket.request).await;

    Ok(form.lock().await.finish_submit(ticket, result))
}
