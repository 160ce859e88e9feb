//! Leave allocation rules.

use chrono::NaiveDate;
use leavedesk_shared::types::{RoleId, is_half_day_multiple};
use rust_decimal::Decimal;

use crate::leave::error::LeaveError;
use crate::leave::types::LeaveAllocation;

/// Checks a day amount for sign and half-day granularity.
pub(crate) fn check_day_amount(field: &'static str, amount: Decimal) -> Result<(), LeaveError> {
    if amount < Decimal::ZERO || !is_half_day_multiple(amount) {
        return Err(LeaveError::InvalidDayAmount { field, amount });
    }
    Ok(())
}

/// Stateless service for allocation policies.
pub struct AllocationService;

impl AllocationService {
    /// Validates an allocation before it is stored.
    ///
    /// # Errors
    ///
    /// - `LeaveError::InvalidDayAmount` for negative or non half-day amounts
    /// - `LeaveError::InvalidAllocation` if the carry-forward limit exceeds
    ///   `total_days`, the period is reversed, or the leave type name is blank
    pub fn validate(allocation: &LeaveAllocation) -> Result<(), LeaveError> {
        check_day_amount("total_days", allocation.total_days)?;
        check_day_amount("max_carry_forward_days", allocation.max_carry_forward_days)?;

        if allocation.max_carry_forward_days > allocation.total_days {
            return Err(LeaveError::InvalidAllocation(format!(
                "max_carry_forward_days {} exceeds total_days {}",
                allocation.max_carry_forward_days, allocation.total_days
            )));
        }
        if let Some(to) = allocation.effective_to
            && to < allocation.effective_from
        {
            return Err(LeaveError::InvalidAllocation(format!(
                "effective_to {to} is before effective_from {}",
                allocation.effective_from
            )));
        }
        if allocation.leave_type_name.trim().is_empty() {
            return Err(LeaveError::InvalidAllocation(
                "leave type name is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Allocations a user with `role` is entitled to on `date`.
    pub fn applicable<'a>(
        allocations: &'a [LeaveAllocation],
        role: RoleId,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'a LeaveAllocation> {
        allocations
            .iter()
            .filter(move |a| a.is_effective_on(date) && a.applies_to_role(role))
    }

    /// Ensures `allocation` is in force on `date`.
    ///
    /// # Errors
    ///
    /// Returns `LeaveError::AllocationNotEffective` otherwise.
    pub fn ensure_effective(allocation: &LeaveAllocation, date: NaiveDate) -> Result<(), LeaveError> {
        if allocation.is_effective_on(date) {
            Ok(())
        } else {
            Err(LeaveError::AllocationNotEffective {
                leave_allocation_id: allocation.id,
                date,
            })
        }
    }
}
