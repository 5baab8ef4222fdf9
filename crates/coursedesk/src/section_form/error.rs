//! Error types for section planning.

use thiserror::Error;

/// Why a candidate section duration does not fit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationError {
    /// Blank, zero or negative duration
    #[error("Estimated duration is required and must be at least {min} minute(s)")]
    BelowMinimum { min: i64 },

    /// The course does not have enough minutes left
    #[error(
        "Estimated duration exceeds the course's remaining time \
         (remaining: {remaining} min, total: {total} min, used: {used} min)"
    )]
    ExceedsRemaining { remaining: i64, total: i64, used: i64 },
}

/// Errors raised by the section form.
#[derive(Debug, Error, Clone)]
pub enum SectionFormError {
    #[error(transparent)]
    Duration(#[from] DurationError),

    #[error("Section title is required")]
    TitleRequired,

    #[error("The section form is not open")]
    FormClosed,

    /// A creation request for this form is still outstanding
    #[error("A section is already being created")]
    SubmissionInFlight,
}

impl SectionFormError {
    /// Returns true if the error was raised locally, before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SectionFormError::Duration(_) | SectionFormError::TitleRequired
        )
    }
}
