//! Weekend policy evaluation and policy period management.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::calendar::error::CalendarError;
use crate::calendar::types::{SaturdayOffPattern, WeekendStatus, WeekendSubtype, WorkingDayPolicy};
use crate::calendar::weekday::is_nth_weekday_of_month;

/// Stateless evaluator deciding whether a date is a weekend holiday.
pub struct WeekendPolicyEvaluator;

impl WeekendPolicyEvaluator {
    /// Evaluates `policy` for `date`.
    ///
    /// Pure function; the caller runs it for every date of a range because the
    /// Saturday patterns depend on where the date sits inside its month.
    #[must_use]
    pub fn evaluate(date: NaiveDate, policy: &WorkingDayPolicy) -> WeekendStatus {
        match date.weekday() {
            Weekday::Sun if policy.sunday_off => WeekendStatus::holiday(WeekendSubtype::Sunday),
            Weekday::Sat if Self::saturday_is_off(date, policy.saturday_off_pattern) => {
                WeekendStatus::holiday(WeekendSubtype::Saturday)
            }
            _ => WeekendStatus::WORKING,
        }
    }

    /// Evaluates `date` against whichever of `policies` is effective on it.
    ///
    /// Without an effective policy no weekend holiday is generated.
    #[must_use]
    pub fn evaluate_with(date: NaiveDate, policies: &[WorkingDayPolicy]) -> WeekendStatus {
        PolicyService::effective_policy(policies, date)
            .map_or(WeekendStatus::WORKING, |policy| Self::evaluate(date, policy))
    }

    fn saturday_is_off(date: NaiveDate, pattern: SaturdayOffPattern) -> bool {
        match pattern {
            SaturdayOffPattern::None => false,
            SaturdayOffPattern::All => true,
            SaturdayOffPattern::SecondOnly => is_nth_weekday_of_month(date, Weekday::Sat, &[2]),
            SaturdayOffPattern::SecondAndFourth => {
                is_nth_weekday_of_month(date, Weekday::Sat, &[2, 4])
            }
        }
    }
}

/// Stateless service for selecting and validating working day policies.
pub struct PolicyService;

impl PolicyService {
    /// Returns the policy effective on `date`.
    ///
    /// Periods are kept disjoint by `validate_new_policy`, so at most one
    /// policy normally matches. If legacy data still overlaps, the one with the
    /// latest `effective_from` wins, then the most recently created.
    #[must_use]
    pub fn effective_policy(
        policies: &[WorkingDayPolicy],
        date: NaiveDate,
    ) -> Option<&WorkingDayPolicy> {
        policies
            .iter()
            .filter(|p| p.is_effective_on(date))
            .max_by_key(|p| (p.effective_from, p.created_at))
    }

    /// Validates a policy about to be stored for an organization.
    ///
    /// # Errors
    ///
    /// - `CalendarError::InvalidPolicyPeriod` if `effective_to < effective_from`
    /// - `CalendarError::OverlappingPolicyPeriod` if the period shares a day with
    ///   any policy in `existing` (other than itself)
    pub fn validate_new_policy(
        candidate: &WorkingDayPolicy,
        existing: &[WorkingDayPolicy],
    ) -> Result<(), CalendarError> {
        if let Some(to) = candidate.effective_to
            && to < candidate.effective_from
        {
            return Err(CalendarError::InvalidPolicyPeriod {
                from: candidate.effective_from,
                to,
            });
        }

        if let Some(clash) = existing
            .iter()
            .filter(|p| p.id != candidate.id && p.organization_id == candidate.organization_id)
            .find(|p| p.overlaps(candidate))
        {
            return Err(CalendarError::OverlappingPolicyPeriod {
                from: candidate.effective_from,
                to: candidate.effective_to,
                existing: clash.id,
            });
        }

        Ok(())
    }
}
