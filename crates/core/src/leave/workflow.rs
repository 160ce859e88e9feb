//! Leave request lifecycle.
//!
//! Each transition returns the updated request together with the updated
//! balance; callers persist both in one transaction.

use chrono::{DateTime, Utc};
use leavedesk_shared::types::{LeaveRequestId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::leave::error::LeaveError;
use crate::leave::types::{LeaveBalance, LeaveRequest, LeaveStatus, WorkingDayResult};

/// What happened to a request, with audit data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LeaveAction {
    /// New request, days moved into `pending`.
    Submit {
        /// Requester.
        submitted_by: UserId,
    },
    /// Pending days moved into `used`.
    Approve {
        /// Reviewer.
        approved_by: UserId,
        /// Optional reviewer comment.
        comment: Option<String>,
    },
    /// Pending days released.
    Reject {
        /// Reviewer.
        rejected_by: UserId,
        /// Required reason.
        reason: String,
    },
    /// Pending days released by the requester.
    Cancel {
        /// Requester.
        cancelled_by: UserId,
    },
    /// Pending request re-dated; `pending` adjusted by the difference.
    Revise {
        /// Days charged before the revision.
        previous_days: Decimal,
    },
}

impl LeaveAction {
    /// Status the request is in after this action.
    #[must_use]
    pub fn new_status(&self) -> LeaveStatus {
        match self {
            Self::Submit { .. } | Self::Revise { .. } => LeaveStatus::Pending,
            Self::Approve { .. } => LeaveStatus::Approved,
            Self::Reject { .. } => LeaveStatus::Rejected,
            Self::Cancel { .. } => LeaveStatus::Cancelled,
        }
    }
}

/// A request and its balance after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveTransition {
    /// Updated request.
    pub request: LeaveRequest,
    /// Updated balance, `version` bumped.
    pub balance: LeaveBalance,
    /// The transition applied.
    pub action: LeaveAction,
}

/// New request as entered by the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeaveRequest {
    /// Requester.
    pub user_id: UserId,
    /// Display name of the balance's leave type.
    pub leave_type_name: String,
    /// Requester's reason.
    pub reason: String,
}

/// Stateless service for leave request transitions.
pub struct LeaveWorkflow;

impl LeaveWorkflow {
    /// Creates a pending request from a successful working-day calculation.
    ///
    /// # Errors
    ///
    /// - `LeaveError::BalanceMismatch` if `balance` belongs to another user
    /// - `LeaveError::InsufficientBalance` if `available < working_days`
    pub fn submit(
        new: NewLeaveRequest,
        days: &WorkingDayResult,
        balance: &LeaveBalance,
        now: DateTime<Utc>,
    ) -> Result<LeaveTransition, LeaveError> {
        if balance.user_id != new.user_id {
            return Err(LeaveError::BalanceMismatch {
                leave_balance_id: balance.id,
            });
        }
        Self::ensure_available(balance.available(), days.working_days)?;

        let mut balance = balance.clone();
        balance.pending += days.working_days;
        balance.version += 1;

        let request = LeaveRequest {
            id: LeaveRequestId::new(),
            user_id: new.user_id,
            leave_balance_id: balance.id,
            leave_type_name: new.leave_type_name,
            start_date: days.range.start,
            end_date: days.range.end,
            number_of_days: days.working_days,
            is_half_day: days.is_half_day,
            status: LeaveStatus::Pending,
            reason: new.reason,
            reviewed_by: None,
            reviewed_at: None,
            review_comment: None,
            created_at: now,
            updated_at: now,
        };

        Ok(LeaveTransition {
            request,
            balance,
            action: LeaveAction::Submit {
                submitted_by: new.user_id,
            },
        })
    }

    /// Approves a pending request.
    ///
    /// # Errors
    ///
    /// - `LeaveError::InvalidTransition` unless `Pending`
    /// - `LeaveError::BalanceMismatch` if `balance` is not the request's
    /// - `LeaveError::PendingUnderflow` if the balance holds too few pending days
    pub fn approve(
        request: &LeaveRequest,
        balance: &LeaveBalance,
        approved_by: UserId,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<LeaveTransition, LeaveError> {
        Self::ensure_transition(request.status, LeaveStatus::Approved)?;
        let mut balance = Self::release_pending(request, balance)?;
        balance.used += request.number_of_days;

        let comment = comment.filter(|c| !c.trim().is_empty());
        let request = Self::reviewed(request, LeaveStatus::Approved, approved_by, comment.clone(), now);
        Ok(LeaveTransition {
            request,
            balance,
            action: LeaveAction::Approve {
                approved_by,
                comment,
            },
        })
    }

    /// Rejects a pending request.
    ///
    /// # Errors
    ///
    /// - `LeaveError::RejectionReasonRequired` for a blank reason
    /// - `LeaveError::InvalidTransition` unless `Pending`
    /// - `LeaveError::BalanceMismatch` if `balance` is not the request's
    /// - `LeaveError::PendingUnderflow` if the balance holds too few pending days
    pub fn reject(
        request: &LeaveRequest,
        balance: &LeaveBalance,
        rejected_by: UserId,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<LeaveTransition, LeaveError> {
        if reason.trim().is_empty() {
            return Err(LeaveError::RejectionReasonRequired);
        }
        Self::ensure_transition(request.status, LeaveStatus::Rejected)?;
        let balance = Self::release_pending(request, balance)?;

        let request = Self::reviewed(
            request,
            LeaveStatus::Rejected,
            rejected_by,
            Some(reason.clone()),
            now,
        );
        Ok(LeaveTransition {
            request,
            balance,
            action: LeaveAction::Reject {
                rejected_by,
                reason,
            },
        })
    }

    /// Cancels a pending request on behalf of its requester.
    ///
    /// # Errors
    ///
    /// - `LeaveError::NotRequester` if `cancelled_by` did not submit it
    /// - `LeaveError::InvalidTransition` unless `Pending`
    /// - `LeaveError::BalanceMismatch` if `balance` is not the request's
    /// - `LeaveError::PendingUnderflow` if the balance holds too few pending days
    pub fn cancel(
        request: &LeaveRequest,
        balance: &LeaveBalance,
        cancelled_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<LeaveTransition, LeaveError> {
        if request.user_id != cancelled_by {
            return Err(LeaveError::NotRequester {
                request_id: request.id,
                user_id: cancelled_by,
            });
        }
        Self::ensure_transition(request.status, LeaveStatus::Cancelled)?;
        let balance = Self::release_pending(request, balance)?;

        let request = Self::reviewed(request, LeaveStatus::Cancelled, cancelled_by, None, now);
        Ok(LeaveTransition {
            request,
            balance,
            action: LeaveAction::Cancel { cancelled_by },
        })
    }

    /// Re-dates a pending request.
    ///
    /// `days` must come from a calculation run with
    /// `exclude_request_id = request.id`. `pending` moves by the difference
    /// and the new amount is checked against `available + previous days`.
    ///
    /// # Errors
    ///
    /// - `LeaveError::InvalidTransition` unless `Pending`
    /// - `LeaveError::BalanceMismatch` if `balance` is not the request's
    /// - `LeaveError::InsufficientBalance` if the new amount does not fit
    pub fn revise(
        request: &LeaveRequest,
        balance: &LeaveBalance,
        days: &WorkingDayResult,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<LeaveTransition, LeaveError> {
        Self::ensure_transition(request.status, LeaveStatus::Pending)?;
        Self::ensure_balance(request, balance)?;

        let previous_days = request.number_of_days;
        Self::ensure_available(balance.available() + previous_days, days.working_days)?;

        let mut balance = balance.clone();
        balance.pending += days.working_days - previous_days;
        balance.version += 1;

        let mut request = request.clone();
        request.start_date = days.range.start;
        request.end_date = days.range.end;
        request.number_of_days = days.working_days;
        request.is_half_day = days.is_half_day;
        if let Some(reason) = reason {
            request.reason = reason;
        }
        request.updated_at = now;

        Ok(LeaveTransition {
            request,
            balance,
            action: LeaveAction::Revise { previous_days },
        })
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Pending → Approved (approve)
    /// - Pending → Rejected (reject)
    /// - Pending → Cancelled (cancel)
    /// - Pending → Pending (revise)
    #[must_use]
    pub fn is_valid_transition(from: LeaveStatus, to: LeaveStatus) -> bool {
        matches!(
            (from, to),
            (
                LeaveStatus::Pending,
                LeaveStatus::Pending
                    | LeaveStatus::Approved
                    | LeaveStatus::Rejected
                    | LeaveStatus::Cancelled
            )
        )
    }

    fn ensure_transition(from: LeaveStatus, to: LeaveStatus) -> Result<(), LeaveError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(LeaveError::InvalidTransition { from, to })
        }
    }

    fn ensure_balance(request: &LeaveRequest, balance: &LeaveBalance) -> Result<(), LeaveError> {
        if request.leave_balance_id != balance.id || request.user_id != balance.user_id {
            return Err(LeaveError::BalanceMismatch {
                leave_balance_id: balance.id,
            });
        }
        Ok(())
    }

    fn ensure_available(available: Decimal, requested: Decimal) -> Result<(), LeaveError> {
        if available < requested {
            return Err(LeaveError::InsufficientBalance {
                requested,
                available,
            });
        }
        Ok(())
    }

    fn release_pending(
        request: &LeaveRequest,
        balance: &LeaveBalance,
    ) -> Result<LeaveBalance, LeaveError> {
        Self::ensure_balance(request, balance)?;
        if balance.pending < request.number_of_days {
            return Err(LeaveError::PendingUnderflow {
                leave_balance_id: balance.id,
                pending: balance.pending,
                requested: request.number_of_days,
            });
        }
        let mut balance = balance.clone();
        balance.pending -= request.number_of_days;
        balance.version += 1;
        Ok(balance)
    }

    fn reviewed(
        request: &LeaveRequest,
        status: LeaveStatus,
        by: UserId,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> LeaveRequest {
        let mut request = request.clone();
        request.status = status;
        request.reviewed_by = Some(by);
        request.reviewed_at = Some(now);
        request.review_comment = comment;
        request.updated_at = now;
        request
    }
}
