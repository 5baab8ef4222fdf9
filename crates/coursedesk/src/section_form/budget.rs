//! Duration budget for adding a section to a course.
//!
//! A course has a total allotted duration; its sections together must not
//! exceed it. A course total of 0 means no limit is enforced, and only the
//! "at least one minute" rule applies.

use super::error::DurationError;
use crate::catalog::Section;
use serde::Serialize;

/// Smallest duration a section may have, in minutes.
pub const MIN_SECTION_MINUTES: i64 = 1;

/// Remaining duration for a course and the verdict for a candidate section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationBudget {
    pub course_duration_minutes: i64,
    pub used_minutes: i64,
    /// Only meaningful when `course_duration_minutes > 0`
    pub remaining_minutes: i64,
    pub candidate_minutes: Option<i64>,
    #[serde(skip)]
    verdict: Result<(), DurationError>,
}

impl DurationBudget {
    /// Computes the budget for `candidate_minutes` given the course total and
    /// the sections already committed.
    pub fn compute(
        course_duration_minutes: i64,
        existing_sections: &[Section],
        candidate_minutes: Option<i64>,
    ) -> Self {
        let used_minutes = existing_sections
            .iter()
            .map(Section::duration_minutes)
            .fold(0i64, |acc, m| acc.saturating_add(m));
        Self::from_used(course_duration_minutes, used_minutes, candidate_minutes)
    }

    /// Same as [`DurationBudget::compute`] with the committed minutes already summed.
    pub fn from_used(
        course_duration_minutes: i64,
        used_minutes: i64,
        candidate_minutes: Option<i64>,
    ) -> Self {
        let course_duration_minutes = course_duration_minutes.max(0);
        let remaining_minutes = course_duration_minutes.saturating_sub(used_minutes);

        let verdict = match candidate_minutes {
            None => Err(DurationError::BelowMinimum {
                min: MIN_SECTION_MINUTES,
            }),
            Some(c) if c < MIN_SECTION_MINUTES => Err(DurationError::BelowMinimum {
                min: MIN_SECTION_MINUTES,
            }),
            Some(c) if course_duration_minutes > 0 && c > remaining_minutes => {
                Err(DurationError::ExceedsRemaining {
                    remaining: remaining_minutes,
                    total: course_duration_minutes,
                    used: used_minutes,
                })
            }
            Some(_) => Ok(()),
        };

        Self {
            course_duration_minutes,
            used_minutes,
            remaining_minutes,
            candidate_minutes,
            verdict,
        }
    }

    /// The valid resting state of a form that is not in use.
    pub fn unrestricted_default(candidate_minutes: i64) -> Self {
        Self::from_used(0, 0, Some(candidate_minutes.max(MIN_SECTION_MINUTES)))
    }

    pub fn is_valid(&self) -> bool {
        self.verdict.is_ok()
    }

    /// Whether the course enforces a total duration at all.
    pub fn is_limited(&self) -> bool {
        self.course_duration_minutes > 0
    }

    /// A limited course with nothing left to give.
    pub fn is_exhausted(&self) -> bool {
        self.is_limited() && self.remaining_minutes <= 0
    }

    pub fn error(&self) -> Option<&DurationError> {
        self.verdict.as_ref().err()
    }

    /// The verdict as a `Result`, for `?` at submit time.
    pub fn check(&self) -> Result<(), DurationError> {
        self.verdict.clone()
    }

    /// Returns the same budget re-evaluated for a different candidate.
    pub fn with_candidate(&self, candidate_minutes: Option<i64>) -> Self {
        Self::from_used(
            self.course_duration_minutes,
            self.used_minutes,
            candidate_minutes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EntityId;

    fn sections(minutes: &[Option<i64>]) -> Vec<Section> {
        minutes
            .iter()
            .enumerate()
            .map(|(i, m)| Section {
                id: EntityId::Number(i as i64),
                course_id: Some(EntityId::Number(1)),
                section_title: None,
                section_description: None,
                estimated_duration_minutes: *m,
            })
            .collect()
    }

    #[test]
    fn test_unlimited_course_skips_budget() {
        let budget = DurationBudget::compute(0, &sections(&[Some(500), Some(900)]), Some(45));
        assert!(budget.is_valid());
        assert!(!budget.is_limited());
        assert!(!budget.is_exhausted());
    }

    #[test]
    fn test_exact_fit_is_allowed() {
        let budget = DurationBudget::compute(120, &sections(&[Some(20), Some(40)]), Some(60));
        assert_eq!(budget.used_minutes, 60);
        assert_eq!(budget.remaining_minutes, 60);
        assert!(budget.is_valid());
    }

    #[test]
    fn test_over_budget_by_one_minute() {
        let budget = DurationBudget::compute(120, &sections(&[Some(20), Some(40)]), Some(61));
        assert!(!budget.is_valid());
        assert_eq!(
            budget.error(),
            Some(&DurationError::ExceedsRemaining {
                remaining: 60,
                total: 120,
                used: 60
            })
        );

        let message = budget.error().unwrap().to_string();
        assert!(message.contains("remaining: 60"), "{}", message);
        assert!(message.contains("total: 120"), "{}", message);
        assert!(message.contains("used: 60"), "{}", message);
    }

    #[test]
    fn test_no_existing_sections() {
        let budget = DurationBudget::compute(90, &[], Some(90));
        assert_eq!(budget.used_minutes, 0);
        assert_eq!(budget.remaining_minutes, 90);
        assert!(budget.is_valid());
    }

    #[test]
    fn test_below_minimum_wins_over_budget() {
        for candidate in [None, Some(0), Some(-5)] {
            // Exhausted course: the minimum message must still be the one reported
            let budget = DurationBudget::compute(60, &sections(&[Some(60)]), candidate);
            assert_eq!(
                budget.error(),
                Some(&DurationError::BelowMinimum { min: 1 }),
                "candidate: {:?}",
                candidate
            );
            assert!(budget.error().unwrap().to_string().contains('1'));
        }
    }

    #[test]
    fn test_missing_durations_count_as_zero() {
        let budget = DurationBudget::compute(100, &sections(&[None, Some(30), None]), Some(70));
        assert_eq!(budget.used_minutes, 30);
        assert!(budget.is_valid());
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let existing = sections(&[Some(15), Some(25)]);
        for candidate in [None, Some(0), Some(1), Some(80), Some(81), Some(10_000)] {
            let a = DurationBudget::compute(120, &existing, candidate);
            let b = DurationBudget::compute(120, &existing, candidate);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_invalid_stays_invalid_past_remaining() {
        let existing = sections(&[Some(50)]);
        let mut seen_over = false;
        for candidate in 1..=200 {
            let budget = DurationBudget::compute(100, &existing, Some(candidate));
            if candidate > budget.remaining_minutes {
                seen_over = true;
            }
            assert_eq!(budget.is_valid(), !seen_over, "candidate: {}", candidate);
        }
    }

    #[test]
    fn test_exhausted_course() {
        let budget = DurationBudget::compute(60, &sections(&[Some(45), Some(30)]), Some(1));
        assert_eq!(budget.remaining_minutes, -15);
        assert!(budget.is_exhausted());
        assert!(matches!(
            budget.check(),
            Err(DurationError::ExceedsRemaining { remaining: -15, .. })
        ));
    }

    #[test]
    fn test_with_candidate_keeps_totals() {
        let budget = DurationBudget::compute(120, &sections(&[Some(100)]), Some(10));
        let next = budget.with_candidate(Some(21));
        assert_eq!(next.used_minutes, 100);
        assert!(budget.is_valid());
        assert!(!next.is_valid());
    }

    #[test]
    fn test_huge_section_durations_saturate() {
        let existing = sections(&[Some(i64::MAX), Some(i64::MAX)]);
        let budget = DurationBudget::compute(120, &existing, Some(10));
        assert_eq!(budget.used_minutes, i64::MAX);
        assert_eq!(budget.remaining_minutes, 120 - i64::MAX);
        assert!(budget.is_exhausted());
        assert!(matches!(
            budget.error(),
            Some(DurationError::ExceedsRemaining { .. })
        ));

        // Unlimited course: the overrun is irrelevant
        let budget = DurationBudget::compute(0, &existing, Some(10));
        assert!(budget.is_valid());
    }

    #[test]
    fn test_from_used_never_overflows() {
        let budget = DurationBudget::from_used(60, i64::MIN, Some(1));
        assert_eq!(budget.remaining_minutes, i64::MAX);
        assert!(budget.is_valid());
    }

    #[test]
    fn test_unrestricted_default_is_valid() {
        let budget = DurationBudget::unrestricted_default(60);
        assert!(budget.is_valid());
        assert_eq!(budget.candidate_minutes, Some(60));
    }
}
