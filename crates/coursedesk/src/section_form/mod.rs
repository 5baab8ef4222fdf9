//! Adding a section to a course without overrunning the course's duration.
mod budget;
mod error;
mod form;

pub use budget::{DurationBudget, MIN_SECTION_MINUTES};
pub use error::{DurationError, SectionFormError};
pub use form::{
    submit_section, SectionDraft, SectionDurationForm, SectionFormView, SubmitControl,
    SubmitOutcome, SubmitTicket, DEFAULT_SECTION_MINUTES,
};
