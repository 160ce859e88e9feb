//! Leave error types.
//!
//! Every variant is a business-rule or validation failure the caller can act
//! on. Storage failures live in the db crate.

use chrono::NaiveDate;
use leavedesk_shared::AppError;
use leavedesk_shared::types::{LeaveAllocationId, LeaveBalanceId, LeaveRequestId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::calendar::CalendarError;
use crate::leave::types::{ConflictingLeave, LeaveStatus};

/// Errors that can occur while validating or transitioning leave.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeaveError {
    /// End date is before start date.
    #[error("Invalid date range: end date {end} is before start date {start}")]
    InvalidDateRange {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// Requested range is longer than allowed.
    #[error(
        "Leave from {start} to {end} spans {span_days} days; split it into requests of at most {max_span_days} days"
    )]
    RangeTooLarge {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
        /// `end - start` in days.
        span_days: i64,
        /// Configured maximum.
        max_span_days: i64,
    },

    /// Every day of the range is a holiday or weekend.
    #[error("No working days between {start} and {end}")]
    NoWorkingDays {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// The range overlaps pending or approved requests of the same user.
    #[error("Leave overlaps existing requests: {summary}", summary = summarize(.conflicts))]
    OverlappingLeave {
        /// The blocking requests.
        conflicts: Vec<ConflictingLeave>,
    },

    /// Not enough days left on the balance.
    #[error("Insufficient leave balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Days requested.
        requested: Decimal,
        /// Days available.
        available: Decimal,
    },

    /// A balance already exists for the user and allocation.
    #[error("User {user_id} already has a balance for allocation {leave_allocation_id}")]
    DuplicateBalance {
        /// The user.
        user_id: UserId,
        /// The allocation.
        leave_allocation_id: LeaveAllocationId,
    },

    /// Status transition not allowed.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: LeaveStatus,
        /// Attempted status.
        to: LeaveStatus,
    },

    /// Only the requester may cancel.
    #[error("User {user_id} did not submit leave request {request_id} and cannot cancel it")]
    NotRequester {
        /// The request.
        request_id: LeaveRequestId,
        /// The user who tried.
        user_id: UserId,
    },

    /// Rejection without a reason.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Day amount is negative or not a multiple of half a day.
    #[error("{field} must be a non-negative multiple of 0.5 days, got {amount}")]
    InvalidDayAmount {
        /// The offending field.
        field: &'static str,
        /// The value supplied.
        amount: Decimal,
    },

    /// Allocation definition breaks its own rules.
    #[error("Invalid leave allocation: {0}")]
    InvalidAllocation(String),

    /// Allocation is not in force on the given date.
    #[error("Leave allocation {leave_allocation_id} is not effective on {date}")]
    AllocationNotEffective {
        /// The allocation.
        leave_allocation_id: LeaveAllocationId,
        /// The date checked.
        date: NaiveDate,
    },

    /// Carried-forward days exceed the allocation's limit.
    #[error("Carried forward {carried_forward} days exceeds the limit of {limit} days")]
    CarryForwardExceedsLimit {
        /// Days supplied.
        carried_forward: Decimal,
        /// Allocation limit.
        limit: Decimal,
    },

    /// The balance passed does not belong to the request or user.
    #[error("Leave balance {leave_balance_id} does not belong to this request")]
    BalanceMismatch {
        /// The balance passed.
        leave_balance_id: LeaveBalanceId,
    },

    /// Releasing more pending days than the balance holds.
    #[error("Leave balance {leave_balance_id} holds {pending} pending days, cannot release {requested}")]
    PendingUnderflow {
        /// The balance.
        leave_balance_id: LeaveBalanceId,
        /// Days held.
        pending: Decimal,
        /// Days to release.
        requested: Decimal,
    },

    /// Calendar resolution failed.
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

fn summarize(conflicts: &[ConflictingLeave]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl LeaveError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidDateRange { .. }
            | Self::RangeTooLarge { .. }
            | Self::InvalidTransition { .. }
            | Self::RejectionReasonRequired
            | Self::InvalidDayAmount { .. }
            | Self::InvalidAllocation(_)
            | Self::CarryForwardExceedsLimit { .. }
            | Self::BalanceMismatch { .. } => 400,

            Self::NotRequester { .. } => 403,

            Self::OverlappingLeave { .. } | Self::DuplicateBalance { .. } => 409,

            Self::NoWorkingDays { .. }
            | Self::InsufficientBalance { .. }
            | Self::AllocationNotEffective { .. } => 422,

            Self::PendingUnderflow { .. } => 500,

            Self::Calendar(err) => err.status_code(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::RangeTooLarge { .. } => "RANGE_TOO_LARGE",
            Self::NoWorkingDays { .. } => "NO_WORKING_DAYS",
            Self::OverlappingLeave { .. } => "OVERLAPPING_LEAVE",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::DuplicateBalance { .. } => "DUPLICATE_BALANCE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotRequester { .. } => "NOT_REQUESTER",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::InvalidDayAmount { .. } => "INVALID_DAY_AMOUNT",
            Self::InvalidAllocation(_) => "INVALID_ALLOCATION",
            Self::AllocationNotEffective { .. } => "ALLOCATION_NOT_EFFECTIVE",
            Self::CarryForwardExceedsLimit { .. } => "CARRY_FORWARD_EXCEEDS_LIMIT",
            Self::BalanceMismatch { .. } => "BALANCE_MISMATCH",
            Self::PendingUnderflow { .. } => "PENDING_UNDERFLOW",
            Self::Calendar(err) => err.error_code(),
        }
    }
}

impl From<LeaveError> for AppError {
    fn from(err: LeaveError) -> Self {
        match err {
            LeaveError::Calendar(inner) => inner.into(),
            LeaveError::NotRequester { .. } => Self::Forbidden(err.to_string()),
            LeaveError::OverlappingLeave { .. } | LeaveError::DuplicateBalance { .. } => {
                Self::Conflict(err.to_string())
            }
            LeaveError::NoWorkingDays { .. }
            | LeaveError::InsufficientBalance { .. }
            | LeaveError::AllocationNotEffective { .. } => Self::BusinessRule(err.to_string()),
            LeaveError::PendingUnderflow { .. } => Self::Internal(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leavedesk_shared::types::DateRange;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_overlapping_leave_lists_every_conflict() {
        let conflicts = vec![
            ConflictingLeave {
                request_id: LeaveRequestId::new(),
                range: DateRange::new(d(2025, 1, 10), d(2025, 1, 12)).unwrap(),
                status: LeaveStatus::Pending,
                leave_type_name: "Casual Leave".to_string(),
            },
            ConflictingLeave {
                request_id: LeaveRequestId::new(),
                range: DateRange::single(d(2025, 1, 14)),
                status: LeaveStatus::Approved,
                leave_type_name: "Sick Leave".to_string(),
            },
        ];
        let err = LeaveError::OverlappingLeave { conflicts };
        assert_eq!(
            err.to_string(),
            "Leave overlaps existing requests: Casual Leave from 2025-01-10 to 2025-01-12 (PENDING); \
             Sick Leave from 2025-01-14 (APPROVED)"
        );
        assert_eq!(err.status_code(), 409);
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }

    #[test]
    fn test_range_too_large_message_directs_to_split() {
        let err = LeaveError::RangeTooLarge {
            start: d(2025, 1, 1),
            end: d(2025, 2, 1),
            span_days: 31,
            max_span_days: 30,
        };
        assert_eq!(err.error_code(), "RANGE_TOO_LARGE");
        assert!(err.to_string().contains("split"));
        assert!(matches!(AppError::from(err), AppError::Validation(_)));
    }

    #[test]
    fn test_insufficient_balance_is_business_rule() {
        let err = LeaveError::InsufficientBalance {
            requested: dec!(3),
            available: dec!(1.5),
        };
        assert_eq!(err.status_code(), 422);
        assert!(err.to_string().contains("1.5"));
        assert!(matches!(AppError::from(err), AppError::BusinessRule(_)));
    }

    #[test]
    fn test_calendar_errors_keep_their_mapping() {
        let err = LeaveError::from(CalendarError::InvalidDateRange {
            start: d(2025, 1, 2),
            end: d(2025, 1, 1),
        });
        assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
        assert_eq!(err.status_code(), 400);
        assert!(matches!(AppError::from(err), AppError::Validation(_)));
    }

    #[test]
    fn test_not_requester_is_forbidden() {
        let err = LeaveError::NotRequester {
            request_id: LeaveRequestId::new(),
            user_id: UserId::new(),
        };
        assert_eq!(err.status_code(), 403);
        assert!(matches!(AppError::from(err), AppError::Forbidden(_)));
    }
}
