//! Leave balance ledger.
//!
//! `available` is always derived; `used` and `pending` only move through the
//! request lifecycle in `workflow`.

use chrono::NaiveDate;
use leavedesk_shared::types::{LeaveBalanceId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::leave::allocation::{AllocationService, check_day_amount};
use crate::leave::error::LeaveError;
use crate::leave::types::{BalanceSummary, LeaveAllocation, LeaveBalance};

/// Admin edit of a balance. `used` is not editable here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    /// New allocated total.
    pub total_allocated: Option<Decimal>,
    /// New carried-forward amount.
    pub carried_forward: Option<Decimal>,
}

/// Non-fatal conditions reported alongside an accepted balance edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceWarning {
    /// The edit left fewer days than already committed.
    NegativeAvailable {
        /// Resulting `available`.
        available: Decimal,
    },
}

/// Result of `LeaveBalanceLedger::update_balance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceUpdateOutcome {
    /// The balance to persist.
    pub balance: LeaveBalance,
    /// Warning to surface, if any.
    pub warning: Option<BalanceWarning>,
}

/// Stateless ledger operations over leave balances.
pub struct LeaveBalanceLedger;

impl LeaveBalanceLedger {
    /// `total_allocated + carried_forward - used - pending`.
    #[must_use]
    pub fn available(balance: &LeaveBalance) -> Decimal {
        balance.available()
    }

    /// Creates the balance for `user_id` against `allocation`.
    ///
    /// `total_allocated` defaults to `allocation.total_days`. `existing` are
    /// the user's current balances; `on` is the creation date the allocation
    /// must be effective on.
    ///
    /// # Errors
    ///
    /// - `LeaveError::AllocationNotEffective` if the allocation is not in force on `on`
    /// - `LeaveError::InvalidDayAmount` for negative or non half-day amounts
    /// - `LeaveError::CarryForwardExceedsLimit` above `max_carry_forward_days`
    /// - `LeaveError::DuplicateBalance` if the user already has one
    pub fn create_balance(
        user_id: UserId,
        allocation: &LeaveAllocation,
        total_allocated: Option<Decimal>,
        carried_forward: Decimal,
        existing: &[LeaveBalance],
        on: NaiveDate,
    ) -> Result<LeaveBalance, LeaveError> {
        AllocationService::ensure_effective(allocation, on)?;

        let total_allocated = total_allocated.unwrap_or(allocation.total_days);
        check_day_amount("total_allocated", total_allocated)?;
        check_day_amount("carried_forward", carried_forward)?;
        Self::check_carry_forward(carried_forward, allocation.max_carry_forward_days)?;

        if existing
            .iter()
            .any(|b| b.user_id == user_id && b.leave_allocation_id == allocation.id)
        {
            return Err(LeaveError::DuplicateBalance {
                user_id,
                leave_allocation_id: allocation.id,
            });
        }

        Ok(LeaveBalance {
            id: LeaveBalanceId::new(),
            user_id,
            leave_allocation_id: allocation.id,
            total_allocated: total_allocated.normalize(),
            used: Decimal::ZERO,
            pending: Decimal::ZERO,
            carried_forward: carried_forward.normalize(),
            version: 0,
        })
    }

    /// Applies an admin edit.
    ///
    /// A resulting negative `available` is accepted and reported as a warning.
    ///
    /// # Errors
    ///
    /// - `LeaveError::InvalidDayAmount` for negative or non half-day amounts
    /// - `LeaveError::CarryForwardExceedsLimit` above `max_carry_forward_days`
    pub fn update_balance(
        balance: &LeaveBalance,
        update: &BalanceUpdate,
        max_carry_forward_days: Decimal,
    ) -> Result<BalanceUpdateOutcome, LeaveError> {
        let mut next = balance.clone();

        if let Some(total) = update.total_allocated {
            check_day_amount("total_allocated", total)?;
            next.total_allocated = total.normalize();
        }
        if let Some(carried) = update.carried_forward {
            check_day_amount("carried_forward", carried)?;
            Self::check_carry_forward(carried, max_carry_forward_days)?;
            next.carried_forward = carried.normalize();
        }
        next.version += 1;

        let available = next.available();
        let warning = (available < Decimal::ZERO)
            .then_some(BalanceWarning::NegativeAvailable { available });

        Ok(BalanceUpdateOutcome {
            balance: next,
            warning,
        })
    }

    /// Sums a user's balances for dashboards.
    #[must_use]
    pub fn summarize(balances: &[LeaveBalance]) -> BalanceSummary {
        balances
            .iter()
            .fold(BalanceSummary::default(), |acc, b| BalanceSummary {
                total_allocated: acc.total_allocated + b.total_allocated,
                carried_forward: acc.carried_forward + b.carried_forward,
                used: acc.used + b.used,
                pending: acc.pending + b.pending,
                available: acc.available + b.available(),
                balance_count: acc.balance_count + 1,
            })
    }

    /// Days to carry from `previous` into a balance for `next_allocation`.
    ///
    /// `available(previous)` clamped to `[0, max_carry_forward_days]`.
    #[must_use]
    pub fn carry_forward_amount(previous: &LeaveBalance, next_allocation: &LeaveAllocation) -> Decimal {
        previous
            .available()
            .min(next_allocation.max_carry_forward_days)
            .max(Decimal::ZERO)
    }

    fn check_carry_forward(carried_forward: Decimal, limit: Decimal) -> Result<(), LeaveError> {
        if carried_forward > limit {
            return Err(LeaveError::CarryForwardExceedsLimit {
                carried_forward,
                limit,
            });
        }
        Ok(())
    }
}
