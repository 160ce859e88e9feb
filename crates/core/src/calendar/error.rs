//! Calendar error types.
//!
//! All variants are expected, caller-recoverable conditions and carry the
//! field, date or identifier needed to render an actionable message.

use chrono::NaiveDate;
use leavedesk_shared::AppError;
use leavedesk_shared::types::{CalendarExceptionId, WorkingDayPolicyId};
use thiserror::Error;

use crate::calendar::types::{HolidayKey, HolidayType};

/// Errors that can occur while maintaining or resolving the calendar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    /// End date is before start date.
    #[error("Invalid date range: end date {end} is before start date {start}")]
    InvalidDateRange {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// Attempted to edit or delete an entry that is not a stored holiday.
    #[error("Holiday {key} is derived, not stored, and cannot be edited or deleted")]
    ReadOnlyHoliday {
        /// The rejected key.
        key: HolidayKey,
    },

    /// Weekend-derived holiday types cannot be persisted.
    #[error("Holiday type {0} is derived from the weekend policy and cannot be stored")]
    WeekendTypeNotStorable(HolidayType),

    /// Exception targets specific classes but lists none.
    #[error(
        "Calendar exception {exception_id} on {date} must apply to all classes or list at least one class"
    )]
    InvalidExceptionScope {
        /// The offending exception.
        exception_id: CalendarExceptionId,
        /// The date it overrides.
        date: NaiveDate,
    },

    /// New policy period overlaps an existing one.
    #[error(
        "Working day policy period {from} to {until} overlaps existing policy {existing}",
        until = .to.map_or_else(|| "open end".to_string(), |d| d.to_string())
    )]
    OverlappingPolicyPeriod {
        /// Start of the rejected period.
        from: NaiveDate,
        /// End of the rejected period.
        to: Option<NaiveDate>,
        /// The policy it clashes with.
        existing: WorkingDayPolicyId,
    },

    /// Policy period ends before it starts.
    #[error("Working day policy ends on {to} before it starts on {from}")]
    InvalidPolicyPeriod {
        /// Start of the rejected period.
        from: NaiveDate,
        /// End of the rejected period.
        to: NaiveDate,
    },

    /// Description is empty.
    #[error("Holiday description is required")]
    DescriptionRequired,
}

impl CalendarError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidDateRange { .. }
            | Self::WeekendTypeNotStorable(_)
            | Self::InvalidExceptionScope { .. }
            | Self::InvalidPolicyPeriod { .. }
            | Self::DescriptionRequired => 400,

            Self::ReadOnlyHoliday { .. } => 403,

            Self::OverlappingPolicyPeriod { .. } => 409,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::ReadOnlyHoliday { .. } => "READ_ONLY_HOLIDAY",
            Self::WeekendTypeNotStorable(_) => "WEEKEND_TYPE_NOT_STORABLE",
            Self::InvalidExceptionScope { .. } => "INVALID_EXCEPTION_SCOPE",
            Self::OverlappingPolicyPeriod { .. } => "OVERLAPPING_POLICY_PERIOD",
            Self::InvalidPolicyPeriod { .. } => "INVALID_POLICY_PERIOD",
            Self::DescriptionRequired => "DESCRIPTION_REQUIRED",
        }
    }
}

impl From<CalendarError> for AppError {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::ReadOnlyHoliday { .. } => Self::Forbidden(err.to_string()),
            CalendarError::OverlappingPolicyPeriod { .. } => Self::Conflict(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}
