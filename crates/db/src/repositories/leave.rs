//! Leave repository: allocations, balances and the request lifecycle.
//!
//! Every request transition runs in one database transaction that locks the
//! request and balance rows (`SELECT ... FOR UPDATE`) and writes the balance
//! back only if its `version` is still the one that was read. The GiST
//! exclusion constraint on `leave_requests` is the final guard against two
//! overlapping submissions racing past the in-memory overlap check.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use leavedesk_core::leave::{
    AllocationService, BalanceSummary, BalanceUpdate, BalanceUpdateOutcome, BalanceWarning,
    ExistingLeave, LeaveAllocation, LeaveBalance, LeaveBalanceLedger, LeaveError, LeaveRequest,
    LeaveStatus, LeaveTransition, LeaveWorkflow, NewLeaveRequest, WorkingDayCalculator, WorkingDayQuery,
    WorkingDayResult,
};
use leavedesk_shared::config::LeaveConfig;
use leavedesk_shared::types::{
    ClassId, DateRange, LeaveAllocationId, LeaveBalanceId, LeaveRequestId, LeaveTypeId,
    OrganizationId, RoleId, UserId, ensure_day_amount,
};
use leavedesk_shared::{AppError, AppResult};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::sea_orm_active_enums::LeaveStatus as DbLeaveStatus;
use crate::entities::{
    leave_allocation_roles, leave_allocations, leave_balances, leave_requests, leave_types,
};
use crate::error::{DbFailure, classify, to_app_error};
use crate::repositories::calendar::load_calendar;
use crate::retry::Retryable;

/// Error types for leave persistence.
#[derive(Debug, thiserror::Error)]
pub enum LeaveRepoError {
    /// Domain rule violated.
    #[error(transparent)]
    Leave(#[from] LeaveError),

    /// Leave type not found.
    #[error("Leave type not found: {0}")]
    LeaveTypeNotFound(LeaveTypeId),

    /// Leave allocation not found.
    #[error("Leave allocation not found: {0}")]
    AllocationNotFound(LeaveAllocationId),

    /// Leave balance not found.
    #[error("Leave balance not found: {0}")]
    BalanceNotFound(LeaveBalanceId),

    /// Leave request not found.
    #[error("Leave request not found: {0}")]
    RequestNotFound(LeaveRequestId),

    /// The balance row changed between read and write.
    #[error("Leave balance {0} was modified concurrently")]
    StaleBalance(LeaveBalanceId),

    /// A stored row violates the half-day amount rules.
    #[error("Stored leave data is invalid: {0}")]
    InvalidData(AppError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<LeaveRepoError> for AppError {
    fn from(err: LeaveRepoError) -> Self {
        match err {
            LeaveRepoError::Leave(e) => e.into(),
            LeaveRepoError::LeaveTypeNotFound(_)
            | LeaveRepoError::AllocationNotFound(_)
            | LeaveRepoError::BalanceNotFound(_)
            | LeaveRepoError::RequestNotFound(_) => Self::NotFound(err.to_string()),
            LeaveRepoError::StaleBalance(_) => Self::SerializationConflict(err.to_string()),
            LeaveRepoError::InvalidData(e) => Self::Internal(e.to_string()),
            LeaveRepoError::Database(e) => to_app_error(e),
        }
    }
}

impl Retryable for LeaveRepoError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::StaleBalance(_) => true,
            Self::Database(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Input for creating a leave allocation.
#[derive(Debug, Clone)]
pub struct CreateAllocationInput {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Leave type granted.
    pub leave_type_id: LeaveTypeId,
    /// Days granted per period.
    pub total_days: Decimal,
    /// Cap on days carried into the next period.
    pub max_carry_forward_days: Decimal,
    /// Roles entitled; empty means every role.
    pub roles: BTreeSet<RoleId>,
    /// First day in force.
    pub effective_from: NaiveDate,
    /// Last day in force.
    pub effective_to: Option<NaiveDate>,
}

/// Input for creating a balance.
#[derive(Debug, Clone)]
pub struct CreateBalanceInput {
    /// Owner.
    pub user_id: UserId,
    /// Allocation instantiated.
    pub leave_allocation_id: LeaveAllocationId,
    /// Defaults to the allocation's `total_days`.
    pub total_allocated: Option<Decimal>,
    /// Days brought over from the previous period.
    pub carried_forward: Decimal,
    /// Creation date; the allocation must be in force on it.
    pub on: NaiveDate,
}

/// Input for submitting a leave request.
#[derive(Debug, Clone)]
pub struct SubmitLeaveInput {
    /// Requester.
    pub user_id: UserId,
    /// Balance to charge.
    pub leave_balance_id: LeaveBalanceId,
    /// Requester's class, for class-scoped exceptions.
    pub class_id: Option<ClassId>,
    /// First day requested.
    pub start_date: NaiveDate,
    /// Last day requested.
    pub end_date: NaiveDate,
    /// Charge half a day less.
    pub is_half_day: bool,
    /// Requester's reason.
    pub reason: String,
}

/// Input for re-dating a pending request.
#[derive(Debug, Clone)]
pub struct ReviseLeaveInput {
    /// Request to revise.
    pub request_id: LeaveRequestId,
    /// Requester's class, for class-scoped exceptions.
    pub class_id: Option<ClassId>,
    /// New first day.
    pub start_date: NaiveDate,
    /// New last day.
    pub end_date: NaiveDate,
    /// Charge half a day less.
    pub is_half_day: bool,
    /// Replacement reason, if any.
    pub reason: Option<String>,
}

/// Leave repository.
#[derive(Debug, Clone)]
pub struct LeaveRepository {
    db: DatabaseConnection,
    calculator: WorkingDayCalculator,
    serialization_retries: u32,
}

impl LeaveRepository {
    /// Creates a new leave repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &LeaveConfig) -> Self {
        Self {
            db,
            calculator: WorkingDayCalculator::new(config.max_request_span_days),
            serialization_retries: config.serialization_retries,
        }
    }

    /// How often callers should retry a serialization conflict.
    #[must_use]
    pub const fn serialization_retries(&self) -> u32 {
        self.serialization_retries
    }

    // ========================================================================
    // Leave types and allocations
    // ========================================================================

    /// Creates a leave type; names are unique per organization.
    pub async fn create_leave_type(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> Result<leave_types::Model, LeaveRepoError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LeaveError::InvalidAllocation("leave type name is required".to_string()).into());
        }
        let model = leave_types::ActiveModel {
            id: Set(LeaveTypeId::new().into_inner()),
            organization_id: Set(organization_id.into_inner()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;
        Ok(model)
    }

    /// Creates an allocation and its role scope.
    pub async fn create_allocation(
        &self,
        input: CreateAllocationInput,
    ) -> Result<LeaveAllocation, LeaveRepoError> {
        let leave_type = leave_types::Entity::find_by_id(input.leave_type_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LeaveRepoError::LeaveTypeNotFound(input.leave_type_id))?;

        let allocation = LeaveAllocation {
            id: LeaveAllocationId::new(),
            organization_id: input.organization_id,
            leave_type_id: input.leave_type_id,
            leave_type_name: leave_type.name,
            total_days: input.total_days.normalize(),
            max_carry_forward_days: input.max_carry_forward_days.normalize(),
            roles: input.roles,
            effective_from: input.effective_from,
            effective_to: input.effective_to,
        };
        AllocationService::validate(&allocation)?;

        let txn = self.db.begin().await?;
        leave_allocations::ActiveModel {
            id: Set(allocation.id.into_inner()),
            organization_id: Set(allocation.organization_id.into_inner()),
            leave_type_id: Set(allocation.leave_type_id.into_inner()),
            total_days: Set(allocation.total_days),
            max_carry_forward_days: Set(allocation.max_carry_forward_days),
            effective_from: Set(allocation.effective_from),
            effective_to: Set(allocation.effective_to),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;
        for role in &allocation.roles {
            leave_allocation_roles::ActiveModel {
                leave_allocation_id: Set(allocation.id.into_inner()),
                role_id: Set(role.into_inner()),
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        info!(
            allocation_id = %allocation.id,
            leave_type = %allocation.leave_type_name,
            total_days = %allocation.total_days,
            "leave allocation created"
        );
        Ok(allocation)
    }

    /// Gets an allocation with its leave type name and roles.
    pub async fn get_allocation(
        &self,
        allocation_id: LeaveAllocationId,
    ) -> Result<LeaveAllocation, LeaveRepoError> {
        load_allocation(&self.db, allocation_id).await
    }

    /// Allocations a holder of `role` is entitled to on `date`.
    pub async fn allocations_for_role(
        &self,
        organization_id: OrganizationId,
        role: RoleId,
        date: NaiveDate,
    ) -> Result<Vec<LeaveAllocation>, LeaveRepoError> {
        let models = leave_allocations::Entity::find()
            .filter(leave_allocations::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_asc(leave_allocations::Column::EffectiveFrom)
            .find_also_related(leave_types::Entity)
            .all(&self.db)
            .await?;

        let roles = load_roles(&self.db, models.iter().map(|(a, _)| a.id)).await?;
        let mut allocations = Vec::with_capacity(models.len());
        for (model, leave_type) in models {
            let scope = roles.get(&model.id).cloned().unwrap_or_default();
            let name = leave_type.map(|t| t.name).unwrap_or_default();
            allocations.push(allocation_from_model(model, name, scope).map_err(LeaveRepoError::InvalidData)?);
        }

        Ok(AllocationService::applicable(&allocations, role, date)
            .cloned()
            .collect())
    }

    // ========================================================================
    // Balances
    // ========================================================================

    /// Creates a user's balance against an allocation.
    ///
    /// Returns `LeaveError::DuplicateBalance` if the user already has one,
    /// whether caught in memory or by the unique constraint.
    pub async fn create_balance(
        &self,
        input: CreateBalanceInput,
    ) -> Result<LeaveBalance, LeaveRepoError> {
        let allocation = load_allocation(&self.db, input.leave_allocation_id).await?;
        let existing = self.list_balances(input.user_id).await?;
        let balance = LeaveBalanceLedger::create_balance(
            input.user_id,
            &allocation,
            input.total_allocated,
            input.carried_forward,
            &existing,
            input.on,
        )?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        let inserted = leave_balances::ActiveModel {
            id: Set(balance.id.into_inner()),
            user_id: Set(balance.user_id.into_inner()),
            leave_allocation_id: Set(balance.leave_allocation_id.into_inner()),
            total_allocated: Set(balance.total_allocated),
            used: Set(balance.used),
            pending: Set(balance.pending),
            carried_forward: Set(balance.carried_forward),
            version: Set(balance.version),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if classify(&e) == DbFailure::UniqueViolation => {
                return Err(LeaveError::DuplicateBalance {
                    user_id: balance.user_id,
                    leave_allocation_id: balance.leave_allocation_id,
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            balance_id = %balance.id,
            user_id = %balance.user_id,
            allocation_id = %balance.leave_allocation_id,
            total_allocated = %balance.total_allocated,
            carried_forward = %balance.carried_forward,
            "leave balance created"
        );
        Ok(balance)
    }

    /// Applies an admin edit to a balance.
    ///
    /// A negative resulting `available` is stored and logged as a warning.
    pub async fn update_balance(
        &self,
        balance_id: LeaveBalanceId,
        update: &BalanceUpdate,
    ) -> Result<BalanceUpdateOutcome, LeaveRepoError> {
        let txn = self.db.begin().await?;
        let balance = lock_balance(&txn, balance_id).await?;
        let allocation = load_allocation(&txn, balance.leave_allocation_id).await?;

        let outcome =
            LeaveBalanceLedger::update_balance(&balance, update, allocation.max_carry_forward_days)?;
        save_balance(&txn, balance.version, &outcome.balance).await?;
        txn.commit().await?;

        if let Some(BalanceWarning::NegativeAvailable { available }) = outcome.warning {
            warn!(
                balance_id = %balance_id,
                user_id = %balance.user_id,
                available = %available,
                "leave balance updated below committed usage"
            );
        }
        Ok(outcome)
    }

    /// Gets a balance.
    pub async fn get_balance(
        &self,
        balance_id: LeaveBalanceId,
    ) -> Result<LeaveBalance, LeaveRepoError> {
        let model = leave_balances::Entity::find_by_id(balance_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LeaveRepoError::BalanceNotFound(balance_id))?;
        balance_from_model(model).map_err(LeaveRepoError::InvalidData)
    }

    /// Lists a user's balances.
    pub async fn list_balances(&self, user_id: UserId) -> Result<Vec<LeaveBalance>, LeaveRepoError> {
        leave_balances::Entity::find()
            .filter(leave_balances::Column::UserId.eq(user_id.into_inner()))
            .order_by_asc(leave_balances::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| balance_from_model(m).map_err(LeaveRepoError::InvalidData))
            .collect()
    }

    /// Sums a user's balances.
    pub async fn balance_summary(&self, user_id: UserId) -> Result<BalanceSummary, LeaveRepoError> {
        let balances = self.list_balances(user_id).await?;
        Ok(LeaveBalanceLedger::summarize(&balances))
    }

    /// Opens the next period's balance, carrying over unused days up to the
    /// new allocation's limit.
    pub async fn carry_forward(
        &self,
        previous_balance_id: LeaveBalanceId,
        next_allocation_id: LeaveAllocationId,
        on: NaiveDate,
    ) -> Result<LeaveBalance, LeaveRepoError> {
        let previous = self.get_balance(previous_balance_id).await?;
        let next = load_allocation(&self.db, next_allocation_id).await?;
        let carried_forward = LeaveBalanceLedger::carry_forward_amount(&previous, &next);

        self.create_balance(CreateBalanceInput {
            user_id: previous.user_id,
            leave_allocation_id: next_allocation_id,
            total_allocated: None,
            carried_forward,
            on,
        })
        .await
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Counts the working days `query` would charge, without storing anything.
    pub async fn calculate_working_days(
        &self,
        organization_id: OrganizationId,
        query: &WorkingDayQuery,
        class_id: Option<ClassId>,
    ) -> Result<WorkingDayResult, LeaveRepoError> {
        let range = self.calculator.validate_range(query.start_date, query.end_date)?;
        let calendar = load_calendar(&self.db, organization_id, &range).await?;
        let existing = existing_leaves(&self.db, query.user_id, &range).await?;
        Ok(self
            .calculator
            .calculate(query, &calendar.sources(), class_id, &existing)?)
    }

    /// Submits a request, moving its days into the balance's `pending`.
    pub async fn submit_request(
        &self,
        input: SubmitLeaveInput,
    ) -> Result<LeaveRequest, LeaveRepoError> {
        let range = self.calculator.validate_range(input.start_date, input.end_date)?;

        let txn = self.db.begin().await?;
        let balance = lock_balance(&txn, input.leave_balance_id).await?;
        let allocation = load_allocation(&txn, balance.leave_allocation_id).await?;
        let calendar = load_calendar(&txn, allocation.organization_id, &range).await?;
        let existing = existing_leaves(&txn, input.user_id, &range).await?;

        let query = WorkingDayQuery {
            user_id: input.user_id,
            start_date: input.start_date,
            end_date: input.end_date,
            is_half_day: input.is_half_day,
            exclude_request_id: None,
        };
        let days = self
            .calculator
            .calculate(&query, &calendar.sources(), input.class_id, &existing)?;
        let transition = LeaveWorkflow::submit(
            NewLeaveRequest {
                user_id: input.user_id,
                leave_type_name: allocation.leave_type_name,
                reason: input.reason,
            },
            &days,
            &balance,
            Utc::now(),
        )?;

        if let Err(e) = request_active_model(&transition.request).insert(&txn).await {
            drop(txn);
            return Err(self.overlap_error(input.user_id, &range, None, e).await);
        }
        save_balance(&txn, balance.version, &transition.balance).await?;
        txn.commit().await?;

        log_transition(&transition, None);
        Ok(transition.request)
    }

    /// Approves a pending request.
    pub async fn approve_request(
        &self,
        request_id: LeaveRequestId,
        approved_by: UserId,
        comment: Option<String>,
    ) -> Result<LeaveRequest, LeaveRepoError> {
        self.transition(request_id, |request, balance, now| {
            LeaveWorkflow::approve(request, balance, approved_by, comment, now)
        })
        .await
    }

    /// Rejects a pending request; `reason` must not be blank.
    pub async fn reject_request(
        &self,
        request_id: LeaveRequestId,
        rejected_by: UserId,
        reason: String,
    ) -> Result<LeaveRequest, LeaveRepoError> {
        self.transition(request_id, |request, balance, now| {
            LeaveWorkflow::reject(request, balance, rejected_by, reason, now)
        })
        .await
    }

    /// Cancels a pending request on behalf of its requester.
    pub async fn cancel_request(
        &self,
        request_id: LeaveRequestId,
        cancelled_by: UserId,
    ) -> Result<LeaveRequest, LeaveRepoError> {
        self.transition(request_id, |request, balance, now| {
            LeaveWorkflow::cancel(request, balance, cancelled_by, now)
        })
        .await
    }

    /// Re-dates a pending request and adjusts `pending` by the difference.
    pub async fn revise_request(
        &self,
        input: ReviseLeaveInput,
    ) -> Result<LeaveRequest, LeaveRepoError> {
        let range = self.calculator.validate_range(input.start_date, input.end_date)?;

        let txn = self.db.begin().await?;
        let (request_model, request, balance) = lock_request(&txn, input.request_id).await?;
        let allocation = load_allocation(&txn, balance.leave_allocation_id).await?;
        let calendar = load_calendar(&txn, allocation.organization_id, &range).await?;
        let existing = existing_leaves(&txn, request.user_id, &range).await?;

        let query = WorkingDayQuery {
            user_id: request.user_id,
            start_date: input.start_date,
            end_date: input.end_date,
            is_half_day: input.is_half_day,
            exclude_request_id: Some(request.id),
        };
        let days = self
            .calculator
            .calculate(&query, &calendar.sources(), input.class_id, &existing)?;
        let transition = LeaveWorkflow::revise(&request, &balance, &days, input.reason, Utc::now())?;

        if let Err(e) = save_request(&txn, request_model, &transition.request).await {
            drop(txn);
            return Err(self
                .overlap_error(request.user_id, &range, Some(request.id), e)
                .await);
        }
        save_balance(&txn, balance.version, &transition.balance).await?;
        txn.commit().await?;

        log_transition(&transition, Some(request.status));
        Ok(transition.request)
    }

    /// Gets a request.
    pub async fn get_request(
        &self,
        request_id: LeaveRequestId,
    ) -> Result<LeaveRequest, LeaveRepoError> {
        let model = leave_requests::Entity::find_by_id(request_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LeaveRepoError::RequestNotFound(request_id))?;
        let names = leave_type_names(&self.db, &[model.leave_balance_id]).await?;
        let name = names.get(&model.leave_balance_id).cloned().unwrap_or_default();
        request_from_model(model, name).map_err(LeaveRepoError::InvalidData)
    }

    /// Lists a user's requests, most recent start first.
    pub async fn list_requests(&self, user_id: UserId) -> Result<Vec<LeaveRequest>, LeaveRepoError> {
        let models = leave_requests::Entity::find()
            .filter(leave_requests::Column::UserId.eq(user_id.into_inner()))
            .order_by_desc(leave_requests::Column::StartDate)
            .all(&self.db)
            .await?;
        let balance_ids: Vec<Uuid> = models.iter().map(|m| m.leave_balance_id).collect();
        let names = leave_type_names(&self.db, &balance_ids).await?;
        models
            .into_iter()
            .map(|m| {
                let name = names.get(&m.leave_balance_id).cloned().unwrap_or_default();
                request_from_model(m, name).map_err(LeaveRepoError::InvalidData)
            })
            .collect()
    }

    async fn transition<F>(
        &self,
        request_id: LeaveRequestId,
        apply: F,
    ) -> Result<LeaveRequest, LeaveRepoError>
    where
        F: FnOnce(&LeaveRequest, &LeaveBalance, DateTime<Utc>) -> Result<LeaveTransition, LeaveError>,
    {
        let txn = self.db.begin().await?;
        let (request_model, request, balance) = lock_request(&txn, request_id).await?;

        let transition = apply(&request, &balance, Utc::now())?;
        save_request(&txn, request_model, &transition.request).await?;
        save_balance(&txn, balance.version, &transition.balance).await?;
        txn.commit().await?;

        log_transition(&transition, Some(request.status));
        Ok(transition.request)
    }

    /// Turns an exclusion violation into `OverlappingLeave` listing the
    /// requests that now block `range`.
    async fn overlap_error(
        &self,
        user_id: UserId,
        range: &DateRange,
        exclude_request_id: Option<LeaveRequestId>,
        err: DbErr,
    ) -> LeaveRepoError {
        if classify(&err) != DbFailure::ExclusionViolation {
            return err.into();
        }
        let existing = match existing_leaves(&self.db, user_id, range).await {
            Ok(existing) => existing,
            Err(requery) => return requery,
        };
        let conflicts =
            WorkingDayCalculator::find_conflicts(user_id, range, exclude_request_id, &existing);
        if conflicts.is_empty() {
            return err.into();
        }
        LeaveError::OverlappingLeave { conflicts }.into()
    }
}

fn log_transition(transition: &LeaveTransition, from: Option<LeaveStatus>) {
    info!(
        request_id = %transition.request.id,
        user_id = %transition.request.user_id,
        from = from.map(|s| s.as_str()),
        to = %transition.request.status,
        days = %transition.request.number_of_days,
        pending = %transition.balance.pending,
        used = %transition.balance.used,
        action = ?transition.action,
        "leave request transitioned"
    );
}

async fn lock_balance<C: ConnectionTrait>(
    conn: &C,
    balance_id: LeaveBalanceId,
) -> Result<LeaveBalance, LeaveRepoError> {
    let model = leave_balances::Entity::find_by_id(balance_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(LeaveRepoError::BalanceNotFound(balance_id))?;
    balance_from_model(model).map_err(LeaveRepoError::InvalidData)
}

/// Locks a request, then its balance.
async fn lock_request<C: ConnectionTrait>(
    conn: &C,
    request_id: LeaveRequestId,
) -> Result<(leave_requests::Model, LeaveRequest, LeaveBalance), LeaveRepoError> {
    let model = leave_requests::Entity::find_by_id(request_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(LeaveRepoError::RequestNotFound(request_id))?;
    let balance = lock_balance(conn, LeaveBalanceId::from_uuid(model.leave_balance_id)).await?;
    let allocation = load_allocation(conn, balance.leave_allocation_id).await?;
    let request = request_from_model(model.clone(), allocation.leave_type_name)
        .map_err(LeaveRepoError::InvalidData)?;
    Ok((model, request, balance))
}

/// Writes `balance` back if the stored version is still `expected_version`.
async fn save_balance<C: ConnectionTrait>(
    conn: &C,
    expected_version: i64,
    balance: &LeaveBalance,
) -> Result<(), LeaveRepoError> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let result = leave_balances::Entity::update_many()
        .col_expr(leave_balances::Column::TotalAllocated, Expr::value(balance.total_allocated))
        .col_expr(leave_balances::Column::Used, Expr::value(balance.used))
        .col_expr(leave_balances::Column::Pending, Expr::value(balance.pending))
        .col_expr(leave_balances::Column::CarriedForward, Expr::value(balance.carried_forward))
        .col_expr(leave_balances::Column::Version, Expr::value(balance.version))
        .col_expr(leave_balances::Column::UpdatedAt, Expr::value(now))
        .filter(leave_balances::Column::Id.eq(balance.id.into_inner()))
        .filter(leave_balances::Column::Version.eq(expected_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(LeaveRepoError::StaleBalance(balance.id));
    }
    Ok(())
}

async fn save_request<C: ConnectionTrait>(
    conn: &C,
    model: leave_requests::Model,
    request: &LeaveRequest,
) -> Result<leave_requests::Model, DbErr> {
    let mut active: leave_requests::ActiveModel = model.into();
    active.start_date = Set(request.start_date);
    active.end_date = Set(request.end_date);
    active.number_of_days = Set(request.number_of_days);
    active.is_half_day = Set(request.is_half_day);
    active.status = Set(request.status.into());
    active.reason = Set(request.reason.clone());
    active.reviewed_by = Set(request.reviewed_by.map(UserId::into_inner));
    active.reviewed_at = Set(request.reviewed_at.map(Into::into));
    active.review_comment = Set(request.review_comment.clone());
    active.updated_at = Set(request.updated_at.into());
    active.update(conn).await
}

fn request_active_model(request: &LeaveRequest) -> leave_requests::ActiveModel {
    leave_requests::ActiveModel {
        id: Set(request.id.into_inner()),
        user_id: Set(request.user_id.into_inner()),
        leave_balance_id: Set(request.leave_balance_id.into_inner()),
        start_date: Set(request.start_date),
        end_date: Set(request.end_date),
        number_of_days: Set(request.number_of_days),
        is_half_day: Set(request.is_half_day),
        status: Set(request.status.into()),
        reason: Set(request.reason.clone()),
        reviewed_by: Set(request.reviewed_by.map(UserId::into_inner)),
        reviewed_at: Set(request.reviewed_at.map(Into::into)),
        review_comment: Set(request.review_comment.clone()),
        created_at: Set(request.created_at.into()),
        updated_at: Set(request.updated_at.into()),
    }
}

async fn load_allocation<C: ConnectionTrait>(
    conn: &C,
    allocation_id: LeaveAllocationId,
) -> Result<LeaveAllocation, LeaveRepoError> {
    let (model, leave_type) = leave_allocations::Entity::find_by_id(allocation_id.into_inner())
        .find_also_related(leave_types::Entity)
        .one(conn)
        .await?
        .ok_or(LeaveRepoError::AllocationNotFound(allocation_id))?;
    let mut roles = load_roles(conn, [model.id]).await?;
    let scope = roles.remove(&model.id).unwrap_or_default();
    let name = leave_type.map(|t| t.name).unwrap_or_default();
    allocation_from_model(model, name, scope).map_err(LeaveRepoError::InvalidData)
}

async fn load_roles<C, I>(conn: &C, allocation_ids: I) -> Result<HashMap<Uuid, BTreeSet<RoleId>>, DbErr>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = Uuid>,
{
    let ids: Vec<Uuid> = allocation_ids.into_iter().collect();
    let mut roles: HashMap<Uuid, BTreeSet<RoleId>> = HashMap::new();
    if ids.is_empty() {
        return Ok(roles);
    }
    let rows = leave_allocation_roles::Entity::find()
        .filter(leave_allocation_roles::Column::LeaveAllocationId.is_in(ids))
        .all(conn)
        .await?;
    for row in rows {
        roles
            .entry(row.leave_allocation_id)
            .or_default()
            .insert(RoleId::from_uuid(row.role_id));
    }
    Ok(roles)
}

/// Leave type name for each balance id.
async fn leave_type_names<C: ConnectionTrait>(
    conn: &C,
    balance_ids: &[Uuid],
) -> Result<HashMap<Uuid, String>, DbErr> {
    if balance_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let balances = leave_balances::Entity::find()
        .filter(leave_balances::Column::Id.is_in(balance_ids.iter().copied()))
        .all(conn)
        .await?;
    let allocations = leave_allocations::Entity::find()
        .filter(leave_allocations::Column::Id.is_in(balances.iter().map(|b| b.leave_allocation_id)))
        .find_also_related(leave_types::Entity)
        .all(conn)
        .await?;

    let by_allocation: HashMap<Uuid, String> = allocations
        .into_iter()
        .filter_map(|(allocation, leave_type)| leave_type.map(|t| (allocation.id, t.name)))
        .collect();
    Ok(balances
        .into_iter()
        .filter_map(|b| {
            by_allocation
                .get(&b.leave_allocation_id)
                .map(|name| (b.id, name.clone()))
        })
        .collect())
}

/// Pending or approved requests of `user_id` overlapping `range`.
async fn existing_leaves<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
    range: &DateRange,
) -> Result<Vec<ExistingLeave>, LeaveRepoError> {
    let models = leave_requests::Entity::find()
        .filter(leave_requests::Column::UserId.eq(user_id.into_inner()))
        .filter(leave_requests::Column::Status.is_in([DbLeaveStatus::Pending, DbLeaveStatus::Approved]))
        .filter(leave_requests::Column::StartDate.lte(range.end))
        .filter(leave_requests::Column::EndDate.gte(range.start))
        .order_by_asc(leave_requests::Column::StartDate)
        .all(conn)
        .await?;

    let balance_ids: Vec<Uuid> = models.iter().map(|m| m.leave_balance_id).collect();
    let names = leave_type_names(conn, &balance_ids).await?;

    let mut existing = Vec::with_capacity(models.len());
    for model in models {
        let name = names.get(&model.leave_balance_id).cloned().unwrap_or_default();
        let request = request_from_model(model, name).map_err(LeaveRepoError::InvalidData)?;
        existing.extend(request.as_existing());
    }
    Ok(existing)
}

fn allocation_from_model(
    model: leave_allocations::Model,
    leave_type_name: String,
    roles: BTreeSet<RoleId>,
) -> AppResult<LeaveAllocation> {
    Ok(LeaveAllocation {
        id: LeaveAllocationId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        leave_type_id: LeaveTypeId::from_uuid(model.leave_type_id),
        leave_type_name,
        total_days: ensure_day_amount("total_days", model.total_days)?,
        max_carry_forward_days: ensure_day_amount(
            "max_carry_forward_days",
            model.max_carry_forward_days,
        )?,
        roles,
        effective_from: model.effective_from,
        effective_to: model.effective_to,
    })
}

fn balance_from_model(model: leave_balances::Model) -> AppResult<LeaveBalance> {
    Ok(LeaveBalance {
        id: LeaveBalanceId::from_uuid(model.id),
        user_id: UserId::from_uuid(model.user_id),
        leave_allocation_id: LeaveAllocationId::from_uuid(model.leave_allocation_id),
        total_allocated: ensure_day_amount("total_allocated", model.total_allocated)?,
        used: ensure_day_amount("used", model.used)?,
        pending: ensure_day_amount("pending", model.pending)?,
        carried_forward: ensure_day_amount("carried_forward", model.carried_forward)?,
        version: model.version,
    })
}

fn request_from_model(model: leave_requests::Model, leave_type_name: String) -> AppResult<LeaveRequest> {
    Ok(LeaveRequest {
        id: LeaveRequestId::from_uuid(model.id),
        user_id: UserId::from_uuid(model.user_id),
        leave_balance_id: LeaveBalanceId::from_uuid(model.leave_balance_id),
        leave_type_name,
        start_date: model.start_date,
        end_date: model.end_date,
        number_of_days: ensure_day_amount("number_of_days", model.number_of_days)?,
        is_half_day: model.is_half_day,
        status: model.status.into(),
        reason: model.reason,
        reviewed_by: model.reviewed_by.map(UserId::from_uuid),
        reviewed_at: model.reviewed_at.map(|t| t.with_timezone(&Utc)),
        review_comment: model.review_comment,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn balance_model(used: Decimal, pending: Decimal) -> leave_balances::Model {
        let now: DateTimeWithTimeZone = Utc::now().into();
        leave_balances::Model {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            leave_allocation_id: Uuid::now_v7(),
            total_allocated: dec!(12.0),
            used,
            pending,
            carried_forward: dec!(2.5),
            version: 7,
            created_at: now,
            updated_at: now,
        }
    }

    fn request_model(days: Decimal) -> leave_requests::Model {
        let now: DateTimeWithTimeZone = Utc::now().into();
        leave_requests::Model {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            leave_balance_id: Uuid::now_v7(),
            start_date: d(2025, 1, 6),
            end_date: d(2025, 1, 8),
            number_of_days: days,
            is_half_day: false,
            status: DbLeaveStatus::Pending,
            reason: "Family event".to_string(),
            reviewed_by: None,
            reviewed_at: None,
            review_comment: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_balance_from_model() {
        let balance = balance_from_model(balance_model(dec!(3.0), dec!(1.5))).unwrap();
        assert_eq!(balance.available(), dec!(10));
        assert_eq!(balance.version, 7);
        assert_eq!(balance.total_allocated.to_string(), "12");
    }

    #[test]
    fn test_balance_from_model_rejects_quarter_days() {
        let err = balance_from_model(balance_model(dec!(0.25), dec!(0))).unwrap_err();
        assert!(err.to_string().contains("used"));
    }

    #[test]
    fn test_request_round_trips_through_active_model() {
        let model = request_model(dec!(3));
        let request = request_from_model(model.clone(), "Casual Leave".to_string()).unwrap();
        assert_eq!(request.status, LeaveStatus::Pending);
        assert_eq!(request.leave_type_name, "Casual Leave");
        assert!(request.as_existing().is_some());

        let active = request_active_model(&request);
        assert_eq!(active.id, Set(model.id));
        assert_eq!(active.status, Set(DbLeaveStatus::Pending));
        assert_eq!(active.number_of_days, Set(dec!(3)));
    }

    #[test]
    fn test_request_from_model_rejects_invalid_days() {
        assert!(request_from_model(request_model(dec!(1.2)), String::new()).is_err());
    }

    #[test]
    fn test_repo_error_mapping() {
        let stale = LeaveRepoError::StaleBalance(LeaveBalanceId::new());
        assert!(stale.is_retryable());
        let err: AppError = stale.into();
        assert!(err.is_retryable());

        let overlap: AppError = LeaveRepoError::Leave(LeaveError::OverlappingLeave {
            conflicts: Vec::new(),
        })
        .into();
        assert!(matches!(overlap, AppError::Conflict(_)));

        let missing: AppError = LeaveRepoError::RequestNotFound(LeaveRequestId::new()).into();
        assert!(matches!(missing, AppError::NotFound(_)));

        let invalid: AppError =
            LeaveRepoError::InvalidData(AppError::Validation("used".into())).into();
        assert!(matches!(invalid, AppError::Internal(_)));

        assert!(!LeaveRepoError::Leave(LeaveError::RejectionReasonRequired).is_retryable());
    }
}
