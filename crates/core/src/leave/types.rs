//! Leave domain types.
//!
//! Allocations are policies, balances are their per-user instantiations, and
//! requests consume a balance through the lifecycle in `workflow`.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use leavedesk_shared::types::{
    DateRange, LeaveAllocationId, LeaveBalanceId, LeaveRequestId, LeaveTypeId, OrganizationId,
    RoleId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::types::HolidayType;

/// Leave request status.
///
/// The valid transitions are:
/// - Pending → Approved (approve)
/// - Pending → Rejected (reject)
/// - Pending → Cancelled (cancel, requester only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    /// Awaiting review; holds days in `pending`.
    Pending,
    /// Approved; days moved to `used`.
    Approved,
    /// Rejected by a reviewer.
    Rejected,
    /// Withdrawn by the requester.
    Cancelled,
}

impl LeaveStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if a request in this status blocks overlapping requests.
    #[must_use]
    pub fn blocks_overlap(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many days of a leave type a set of roles is entitled to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveAllocation {
    /// Unique identifier.
    pub id: LeaveAllocationId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Leave type granted.
    pub leave_type_id: LeaveTypeId,
    /// Display name of the leave type.
    pub leave_type_name: String,
    /// Days granted per balance.
    pub total_days: Decimal,
    /// Upper bound on days carried into the next period.
    pub max_carry_forward_days: Decimal,
    /// Roles entitled to the allocation; empty means every role.
    pub roles: BTreeSet<RoleId>,
    /// First day the allocation applies.
    pub effective_from: NaiveDate,
    /// Last day the allocation applies; open-ended when `None`.
    pub effective_to: Option<NaiveDate>,
}

impl LeaveAllocation {
    /// Returns true if the allocation covers `date`.
    #[must_use]
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.effective_from <= date && self.effective_to.is_none_or(|to| date <= to)
    }

    /// Returns true if `role` is entitled to this allocation.
    #[must_use]
    pub fn applies_to_role(&self, role: RoleId) -> bool {
        self.roles.is_empty() || self.roles.contains(&role)
    }
}

/// Per-user balance for one allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    /// Unique identifier.
    pub id: LeaveBalanceId,
    /// Owner.
    pub user_id: UserId,
    /// Allocation this balance instantiates.
    pub leave_allocation_id: LeaveAllocationId,
    /// Days granted for the period.
    pub total_allocated: Decimal,
    /// Days consumed by approved requests.
    pub used: Decimal,
    /// Days held by pending requests.
    pub pending: Decimal,
    /// Days brought over from the previous period.
    pub carried_forward: Decimal,
    /// Optimistic concurrency version, bumped on every mutation.
    pub version: i64,
}

impl LeaveBalance {
    /// `total_allocated + carried_forward - used - pending`.
    #[must_use]
    pub fn available(&self) -> Decimal {
        self.total_allocated + self.carried_forward - self.used - self.pending
    }
}

/// Dashboard totals across a user's balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceSummary {
    /// Sum of `total_allocated`.
    pub total_allocated: Decimal,
    /// Sum of `carried_forward`.
    pub carried_forward: Decimal,
    /// Sum of `used`.
    pub used: Decimal,
    /// Sum of `pending`.
    pub pending: Decimal,
    /// Sum of `available`.
    pub available: Decimal,
    /// Number of balances summed.
    pub balance_count: usize,
}

/// A leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier.
    pub id: LeaveRequestId,
    /// Requester.
    pub user_id: UserId,
    /// Balance the request draws from.
    pub leave_balance_id: LeaveBalanceId,
    /// Display name of the leave type, for conflict summaries.
    pub leave_type_name: String,
    /// First day of leave.
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Working days charged to the balance.
    pub number_of_days: Decimal,
    /// Whether half a day was deducted.
    pub is_half_day: bool,
    /// Lifecycle status.
    pub status: LeaveStatus,
    /// Requester's reason.
    pub reason: String,
    /// Reviewer or canceller.
    pub reviewed_by: Option<UserId>,
    /// When the request left `Pending`.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Approval comment or rejection reason.
    pub review_comment: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// The requested interval, or `None` if the row is malformed.
    #[must_use]
    pub fn range(&self) -> Option<DateRange> {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Projection used for overlap checks.
    #[must_use]
    pub fn as_existing(&self) -> Option<ExistingLeave> {
        Some(ExistingLeave {
            request_id: self.id,
            user_id: self.user_id,
            range: self.range()?,
            status: self.status,
            leave_type_name: self.leave_type_name.clone(),
        })
    }
}

/// An already stored request, as seen by the overlap check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingLeave {
    /// The stored request.
    pub request_id: LeaveRequestId,
    /// Its requester.
    pub user_id: UserId,
    /// Its interval.
    pub range: DateRange,
    /// Its status.
    pub status: LeaveStatus,
    /// Display name of its leave type.
    pub leave_type_name: String,
}

/// A request that blocks a new one, carried by `LeaveError::OverlappingLeave`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictingLeave {
    /// The blocking request.
    pub request_id: LeaveRequestId,
    /// Its interval.
    pub range: DateRange,
    /// Its status.
    pub status: LeaveStatus,
    /// Display name of its leave type.
    pub leave_type_name: String,
}

impl From<&ExistingLeave> for ConflictingLeave {
    fn from(existing: &ExistingLeave) -> Self {
        Self {
            request_id: existing.request_id,
            range: existing.range,
            status: existing.status,
            leave_type_name: existing.leave_type_name.clone(),
        }
    }
}

impl fmt::Display for ConflictingLeave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} ({})",
            self.leave_type_name, self.range, self.status
        )
    }
}

/// Input to the working-day calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDayQuery {
    /// Requester.
    pub user_id: UserId,
    /// First day of leave.
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Deduct half a day from the count.
    pub is_half_day: bool,
    /// Request being revised, ignored by the overlap check.
    pub exclude_request_id: Option<LeaveRequestId>,
}

/// A non-working date inside a requested range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedDay {
    /// The date.
    pub date: NaiveDate,
    /// Description of its primary reason.
    pub description: String,
    /// Type of its primary reason.
    pub holiday_type: HolidayType,
}

/// Result of a successful working-day calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDayResult {
    /// The validated range.
    pub range: DateRange,
    /// Days charged, after the half-day deduction.
    pub working_days: Decimal,
    /// Calendar days in the range.
    pub total_days: i64,
    /// Non-working dates excluded from the count.
    pub holidays: Vec<ExcludedDay>,
    /// Whether half a day was deducted.
    pub is_half_day: bool,
}
