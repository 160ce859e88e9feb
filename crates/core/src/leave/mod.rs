//! Leave allocations, balances and requests.
//!
//! # Modules
//!
//! - `types` - Allocations, balances, requests and calculation results
//! - `error` - Leave-specific error types
//! - `allocation` - Allocation validation and applicability
//! - `balance` - Balance creation, admin edits, rollups and carry-forward
//! - `working_days` - Working-day counting and overlap detection
//! - `workflow` - Request lifecycle and its balance effects

pub mod allocation;
pub mod balance;
pub mod error;
pub mod types;
pub mod workflow;
pub mod working_days;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod workflow_props;

pub use allocation::AllocationService;
pub use balance::{BalanceUpdate, BalanceUpdateOutcome, BalanceWarning, LeaveBalanceLedger};
pub use error::LeaveError;
pub use types::{
    BalanceSummary, ConflictingLeave, ExcludedDay, ExistingLeave, LeaveAllocation, LeaveBalance,
    LeaveRequest, LeaveStatus, WorkingDayQuery, WorkingDayResult,
};
pub use workflow::{LeaveAction, LeaveTransition, LeaveWorkflow, NewLeaveRequest};
pub use working_days::{DEFAULT_MAX_SPAN_DAYS, WorkingDayCalculator};
