//! Working-day counting and overlap detection for leave requests.

use chrono::NaiveDate;
use leavedesk_shared::types::{ClassId, DateRange, HALF_DAY, LeaveRequestId, UserId};
use rust_decimal::Decimal;

use crate::calendar::{CalendarSources, HolidayCalendarResolver};
use crate::leave::error::LeaveError;
use crate::leave::types::{
    ConflictingLeave, ExcludedDay, ExistingLeave, WorkingDayQuery, WorkingDayResult,
};

/// Default longest allowed `end - start`, in days.
pub const DEFAULT_MAX_SPAN_DAYS: i64 = 30;

/// Validates a requested range and counts the days it charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingDayCalculator {
    max_span_days: i64,
}

impl Default for WorkingDayCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SPAN_DAYS)
    }
}

impl WorkingDayCalculator {
    /// Creates a calculator allowing ranges with `end - start <= max_span_days`.
    #[must_use]
    pub const fn new(max_span_days: i64) -> Self {
        Self { max_span_days }
    }

    /// Longest allowed `end - start`, in days.
    #[must_use]
    pub const fn max_span_days(&self) -> i64 {
        self.max_span_days
    }

    /// Checks ordering and length of `[start, end]`.
    ///
    /// # Errors
    ///
    /// - `LeaveError::InvalidDateRange` if `end < start`
    /// - `LeaveError::RangeTooLarge` if `end - start` exceeds the maximum
    pub fn validate_range(&self, start: NaiveDate, end: NaiveDate) -> Result<DateRange, LeaveError> {
        let range = DateRange::new(start, end).ok_or(LeaveError::InvalidDateRange { start, end })?;
        let span_days = range.span_days();
        if span_days > self.max_span_days {
            return Err(LeaveError::RangeTooLarge {
                start,
                end,
                span_days,
                max_span_days: self.max_span_days,
            });
        }
        Ok(range)
    }

    /// Counts working days for `query` and rejects overlaps.
    ///
    /// `sources` is the requester's organization calendar, `class_id` their
    /// class, and `existing` any stored requests that might overlap (other
    /// users and non-blocking statuses are ignored).
    ///
    /// # Errors
    ///
    /// In order of evaluation:
    /// - `LeaveError::InvalidDateRange`
    /// - `LeaveError::RangeTooLarge`
    /// - `LeaveError::NoWorkingDays` if every day is non-working
    /// - `LeaveError::OverlappingLeave` listing each blocking request
    pub fn calculate(
        &self,
        query: &WorkingDayQuery,
        sources: &CalendarSources<'_>,
        class_id: Option<ClassId>,
        existing: &[ExistingLeave],
    ) -> Result<WorkingDayResult, LeaveError> {
        let range = self.validate_range(query.start_date, query.end_date)?;
        let calendar = HolidayCalendarResolver::resolve_range(sources, range, class_id);

        let total_days = range.total_days();
        let working = calendar.working_day_count();
        if working == 0 {
            return Err(LeaveError::NoWorkingDays {
                start: range.start,
                end: range.end,
            });
        }

        let conflicts = Self::find_conflicts(
            query.user_id,
            &range,
            query.exclude_request_id,
            existing,
        );
        if !conflicts.is_empty() {
            return Err(LeaveError::OverlappingLeave { conflicts });
        }

        let mut working_days = Decimal::from(working);
        if query.is_half_day {
            working_days -= HALF_DAY;
        }

        let holidays = calendar
            .non_working_days()
            .filter_map(|day| {
                day.primary_entry().map(|entry| ExcludedDay {
                    date: day.date,
                    description: entry.description.clone(),
                    holiday_type: entry.holiday_type,
                })
            })
            .collect();

        Ok(WorkingDayResult {
            range,
            working_days,
            total_days,
            holidays,
            is_half_day: query.is_half_day,
        })
    }

    /// Pending or approved requests of `user_id` overlapping `range`, except
    /// `exclude_request_id`.
    #[must_use]
    pub fn find_conflicts(
        user_id: UserId,
        range: &DateRange,
        exclude_request_id: Option<LeaveRequestId>,
        existing: &[ExistingLeave],
    ) -> Vec<ConflictingLeave> {
        existing
            .iter()
            .filter(|leave| {
                leave.user_id == user_id
                    && leave.status.blocks_overlap()
                    && Some(leave.request_id) != exclude_request_id
                    && leave.range.overlaps(range)
            })
            .map(ConflictingLeave::from)
            .collect()
    }
}
