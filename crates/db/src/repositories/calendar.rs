//! Calendar repository: working day policies, holidays and exceptions.
//!
//! Writes validate through the calendar services before touching the
//! database. Reads load an organization's calendar data once and resolve it
//! in memory with `HolidayCalendarResolver`.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use leavedesk_core::calendar::{
    CalendarEntry, CalendarError, CalendarException, CalendarSources, ExceptionService, Holiday,
    HolidayCalendarResolver, HolidayKey, HolidayService, HolidayType, MonthSummary, OverrideType,
    PolicyService, ResolvedCalendar, SaturdayOffPattern, WorkingDayPolicy,
};
use leavedesk_shared::AppError;
use leavedesk_shared::types::{
    CalendarExceptionId, ClassId, DateRange, HolidayId, OrganizationId, WorkingDayPolicyId,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::entities::{calendar_exception_classes, calendar_exceptions, holidays, working_day_policies};
use crate::error::{DbFailure, classify, to_app_error};
use crate::retry::Retryable;

/// Error types for calendar persistence.
#[derive(Debug, thiserror::Error)]
pub enum CalendarRepoError {
    /// Domain validation failed.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// Working day policy not found.
    #[error("Working day policy not found: {0}")]
    PolicyNotFound(WorkingDayPolicyId),

    /// Holiday not found.
    #[error("Holiday not found: {0}")]
    HolidayNotFound(HolidayId),

    /// Calendar exception not found.
    #[error("Calendar exception not found: {0}")]
    ExceptionNotFound(CalendarExceptionId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CalendarRepoError> for AppError {
    fn from(err: CalendarRepoError) -> Self {
        match err {
            CalendarRepoError::Calendar(e) => e.into(),
            CalendarRepoError::PolicyNotFound(_)
            | CalendarRepoError::HolidayNotFound(_)
            | CalendarRepoError::ExceptionNotFound(_) => Self::NotFound(err.to_string()),
            CalendarRepoError::Database(e) => to_app_error(e),
        }
    }
}

impl Retryable for CalendarRepoError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(e) if e.is_retryable())
    }
}

/// Input for creating a working day policy.
#[derive(Debug, Clone)]
pub struct CreatePolicyInput {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Whether Sundays are off.
    pub sunday_off: bool,
    /// Which Saturdays are off.
    pub saturday_off_pattern: SaturdayOffPattern,
    /// First day in force.
    pub effective_from: NaiveDate,
    /// Last day in force; open-ended when `None`.
    pub effective_to: Option<NaiveDate>,
}

/// Input for creating or replacing a stored holiday.
#[derive(Debug, Clone)]
pub struct HolidayInput {
    /// First day off.
    pub start_date: NaiveDate,
    /// Last day off.
    pub end_date: NaiveDate,
    /// Holiday category; weekend-derived types are rejected.
    pub holiday_type: HolidayType,
    /// Display text.
    pub description: String,
}

/// Input for creating a calendar exception.
#[derive(Debug, Clone)]
pub struct CreateExceptionInput {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Overridden date.
    pub date: NaiveDate,
    /// Forced status.
    pub override_type: OverrideType,
    /// Applies organization-wide.
    pub is_applicable_to_all_classes: bool,
    /// Targeted classes when not organization-wide.
    pub classes: BTreeSet<ClassId>,
    /// Why the date is overridden.
    pub reason: String,
}

/// An organization's calendar data, loaded once and resolved in memory.
#[derive(Debug, Clone, Default)]
pub struct CalendarData {
    /// Every policy of the organization.
    pub policies: Vec<WorkingDayPolicy>,
    /// Stored holidays touching the loaded window.
    pub holidays: Vec<Holiday>,
    /// Exceptions inside the loaded window.
    pub exceptions: Vec<CalendarException>,
}

impl CalendarData {
    /// Borrows the data as resolver input.
    #[must_use]
    pub fn sources(&self) -> CalendarSources<'_> {
        CalendarSources {
            policies: &self.policies,
            holidays: &self.holidays,
            exceptions: &self.exceptions,
        }
    }
}

/// Calendar repository.
#[derive(Debug, Clone)]
pub struct CalendarRepository {
    db: DatabaseConnection,
}

impl CalendarRepository {
    /// Creates a new calendar repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Working day policies
    // ========================================================================

    /// Creates a working day policy.
    ///
    /// Periods of one organization never overlap. The check runs against the
    /// stored policies first; the exclusion constraint catches a concurrent
    /// writer that slipped past it.
    pub async fn create_policy(
        &self,
        input: CreatePolicyInput,
    ) -> Result<WorkingDayPolicy, CalendarRepoError> {
        let policy = WorkingDayPolicy {
            id: WorkingDayPolicyId::new(),
            organization_id: input.organization_id,
            sunday_off: input.sunday_off,
            saturday_off_pattern: input.saturday_off_pattern,
            effective_from: input.effective_from,
            effective_to: input.effective_to,
            created_at: Utc::now(),
        };

        let existing = load_policies(&self.db, input.organization_id).await?;
        PolicyService::validate_new_policy(&policy, &existing)?;

        let model = working_day_policies::ActiveModel {
            id: Set(policy.id.into_inner()),
            organization_id: Set(policy.organization_id.into_inner()),
            sunday_off: Set(policy.sunday_off),
            saturday_off_pattern: Set(policy.saturday_off_pattern.into()),
            effective_from: Set(policy.effective_from),
            effective_to: Set(policy.effective_to),
            created_at: Set(policy.created_at.into()),
        };

        if let Err(e) = model.insert(&self.db).await {
            return Err(self.policy_write_error(&policy, e).await);
        }

        info!(
            policy_id = %policy.id,
            organization_id = %policy.organization_id,
            from = %policy.effective_from,
            "working day policy created"
        );
        Ok(policy)
    }

    /// Closes an open policy on `effective_to`.
    pub async fn end_policy(
        &self,
        policy_id: WorkingDayPolicyId,
        effective_to: NaiveDate,
    ) -> Result<WorkingDayPolicy, CalendarRepoError> {
        let model = working_day_policies::Entity::find_by_id(policy_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(CalendarRepoError::PolicyNotFound(policy_id))?;

        let mut policy = policy_from_model(model.clone());
        policy.effective_to = Some(effective_to);
        let existing = load_policies(&self.db, policy.organization_id).await?;
        PolicyService::validate_new_policy(&policy, &existing)?;

        let mut active: working_day_policies::ActiveModel = model.into();
        active.effective_to = Set(Some(effective_to));
        let updated = match active.update(&self.db).await {
            Ok(updated) => updated,
            Err(e) => return Err(self.policy_write_error(&policy, e).await),
        };

        info!(
            policy_id = %policy.id,
            to = %effective_to,
            "working day policy period ended"
        );
        Ok(policy_from_model(updated))
    }

    /// Maps a failed policy write. An exclusion violation means another
    /// writer stored an overlapping period after our check, so the policy is
    /// validated again against what is stored now.
    async fn policy_write_error(
        &self,
        policy: &WorkingDayPolicy,
        err: DbErr,
    ) -> CalendarRepoError {
        if classify(&err) != DbFailure::ExclusionViolation {
            return err.into();
        }
        match load_policies(&self.db, policy.organization_id).await {
            Ok(existing) => recheck_policy(policy, &existing, err),
            Err(load_err) => load_err.into(),
        }
    }

    /// Lists an organization's policies, oldest period first.
    pub async fn list_policies(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<WorkingDayPolicy>, CalendarRepoError> {
        Ok(load_policies(&self.db, organization_id).await?)
    }

    // ========================================================================
    // Stored holidays
    // ========================================================================

    /// Creates a stored holiday.
    pub async fn create_holiday(
        &self,
        organization_id: OrganizationId,
        input: HolidayInput,
    ) -> Result<Holiday, CalendarRepoError> {
        let holiday = Holiday {
            id: HolidayId::new(),
            organization_id,
            start_date: input.start_date,
            end_date: input.end_date,
            holiday_type: input.holiday_type,
            description: input.description.trim().to_string(),
        };
        HolidayService::validate(&holiday)?;

        let now = Utc::now().into();
        holidays::ActiveModel {
            id: Set(holiday.id.into_inner()),
            organization_id: Set(organization_id.into_inner()),
            start_date: Set(holiday.start_date),
            end_date: Set(holiday.end_date),
            holiday_type: Set(holiday.holiday_type.into()),
            description: Set(holiday.description.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        Ok(holiday)
    }

    /// Replaces a stored holiday.
    ///
    /// Generated weekend and exception keys are refused with
    /// `CalendarError::ReadOnlyHoliday`.
    pub async fn update_holiday(
        &self,
        key: &HolidayKey,
        input: HolidayInput,
    ) -> Result<Holiday, CalendarRepoError> {
        let model = self.find_editable_holiday(key).await?;
        let mut holiday = holiday_from_model(model.clone());
        holiday.start_date = input.start_date;
        holiday.end_date = input.end_date;
        holiday.holiday_type = input.holiday_type;
        holiday.description = input.description.trim().to_string();
        HolidayService::validate(&holiday)?;

        let mut active: holidays::ActiveModel = model.into();
        active.start_date = Set(holiday.start_date);
        active.end_date = Set(holiday.end_date);
        active.holiday_type = Set(holiday.holiday_type.into());
        active.description = Set(holiday.description.clone());
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await?;

        Ok(holiday)
    }

    /// Deletes a stored holiday.
    pub async fn delete_holiday(&self, key: &HolidayKey) -> Result<(), CalendarRepoError> {
        let model = self.find_editable_holiday(key).await?;
        model.delete(&self.db).await?;
        Ok(())
    }

    async fn find_editable_holiday(
        &self,
        key: &HolidayKey,
    ) -> Result<holidays::Model, CalendarRepoError> {
        let id = HolidayService::editable_id(key)?;
        let model = holidays::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(CalendarRepoError::HolidayNotFound(id))?;
        HolidayService::ensure_editable(&holiday_from_model(model.clone()))?;
        Ok(model)
    }

    // ========================================================================
    // Calendar exceptions
    // ========================================================================

    /// Creates a calendar exception together with its class scope.
    pub async fn create_exception(
        &self,
        input: CreateExceptionInput,
    ) -> Result<CalendarException, CalendarRepoError> {
        let classes = if input.is_applicable_to_all_classes {
            BTreeSet::new()
        } else {
            input.classes
        };
        let exception = CalendarException {
            id: CalendarExceptionId::new(),
            organization_id: input.organization_id,
            date: input.date,
            override_type: input.override_type,
            is_applicable_to_all_classes: input.is_applicable_to_all_classes,
            classes,
            reason: input.reason,
            created_at: Utc::now(),
        };
        ExceptionService::validate(&exception)?;

        let txn = self.db.begin().await?;
        calendar_exceptions::ActiveModel {
            id: Set(exception.id.into_inner()),
            organization_id: Set(exception.organization_id.into_inner()),
            date: Set(exception.date),
            override_type: Set(exception.override_type.into()),
            is_applicable_to_all_classes: Set(exception.is_applicable_to_all_classes),
            reason: Set(exception.reason.clone()),
            created_at: Set(exception.created_at.into()),
        }
        .insert(&txn)
        .await?;

        for class_id in &exception.classes {
            calendar_exception_classes::ActiveModel {
                calendar_exception_id: Set(exception.id.into_inner()),
                class_id: Set(class_id.into_inner()),
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        info!(
            exception_id = %exception.id,
            date = %exception.date,
            override_type = %exception.override_type,
            "calendar exception created"
        );
        Ok(exception)
    }

    /// Deletes a calendar exception; its class rows cascade.
    pub async fn delete_exception(
        &self,
        exception_id: CalendarExceptionId,
    ) -> Result<(), CalendarRepoError> {
        let result = calendar_exceptions::Entity::delete_by_id(exception_id.into_inner())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(CalendarRepoError::ExceptionNotFound(exception_id));
        }
        Ok(())
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Loads the calendar data needed to resolve `range`.
    pub async fn load_sources(
        &self,
        organization_id: OrganizationId,
        range: &DateRange,
    ) -> Result<CalendarData, CalendarRepoError> {
        Ok(load_calendar(&self.db, organization_id, range).await?)
    }

    /// Resolves `[from, to]` for a class of an organization.
    pub async fn resolve(
        &self,
        organization_id: OrganizationId,
        from: NaiveDate,
        to: NaiveDate,
        class_id: Option<ClassId>,
    ) -> Result<ResolvedCalendar, CalendarRepoError> {
        let range =
            DateRange::new(from, to).ok_or(CalendarError::InvalidDateRange { start: from, end: to })?;
        let data = self.load_sources(organization_id, &range).await?;
        Ok(HolidayCalendarResolver::resolve_range(
            &data.sources(),
            range,
            class_id,
        ))
    }

    /// Next non-working days from `now` on, looking at most
    /// `MAX_LOOKAHEAD_DAYS` ahead.
    pub async fn upcoming_holidays(
        &self,
        organization_id: OrganizationId,
        now: DateTime<Utc>,
        lookahead_days: i64,
        limit: usize,
        include_weekends: bool,
        class_id: Option<ClassId>,
    ) -> Result<Vec<CalendarEntry>, CalendarRepoError> {
        let Some(range) =
            HolidayCalendarResolver::lookahead_range(now.date_naive(), lookahead_days)
        else {
            return Ok(Vec::new());
        };
        let data = self.load_sources(organization_id, &range).await?;
        Ok(HolidayCalendarResolver::upcoming_holidays(
            &data.sources(),
            now,
            lookahead_days,
            limit,
            include_weekends,
            class_id,
        ))
    }

    /// Working/non-working totals for one month, `None` for an invalid month.
    pub async fn month_summary(
        &self,
        organization_id: OrganizationId,
        year: i32,
        month: u32,
        class_id: Option<ClassId>,
    ) -> Result<Option<MonthSummary>, CalendarRepoError> {
        let Some(range) = DateRange::month(year, month) else {
            return Ok(None);
        };
        let data = self.load_sources(organization_id, &range).await?;
        Ok(HolidayCalendarResolver::month_summary(
            &data.sources(),
            year,
            month,
            class_id,
        ))
    }
}

/// Loads everything the resolver needs for `range`.
pub(crate) async fn load_calendar<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    range: &DateRange,
) -> Result<CalendarData, DbErr> {
    let policies = load_policies(conn, organization_id).await?;

    let holidays = holidays::Entity::find()
        .filter(holidays::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(holidays::Column::StartDate.lte(range.end))
        .filter(holidays::Column::EndDate.gte(range.start))
        .order_by_asc(holidays::Column::StartDate)
        .all(conn)
        .await?
        .into_iter()
        .map(holiday_from_model)
        .collect();

    let exception_models = calendar_exceptions::Entity::find()
        .filter(calendar_exceptions::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(calendar_exceptions::Column::Date.between(range.start, range.end))
        .all(conn)
        .await?;

    let mut classes: HashMap<uuid::Uuid, BTreeSet<ClassId>> = HashMap::new();
    if !exception_models.is_empty() {
        let rows = calendar_exception_classes::Entity::find()
            .filter(
                calendar_exception_classes::Column::CalendarExceptionId
                    .is_in(exception_models.iter().map(|e| e.id)),
            )
            .all(conn)
            .await?;
        for row in rows {
            classes
                .entry(row.calendar_exception_id)
                .or_default()
                .insert(ClassId::from_uuid(row.class_id));
        }
    }

    let exceptions = exception_models
        .into_iter()
        .map(|model| {
            let scope = classes.remove(&model.id).unwrap_or_default();
            exception_from_model(model, scope)
        })
        .collect();

    Ok(CalendarData {
        policies,
        holidays,
        exceptions,
    })
}

async fn load_policies<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<Vec<WorkingDayPolicy>, DbErr> {
    Ok(working_day_policies::Entity::find()
        .filter(working_day_policies::Column::OrganizationId.eq(organization_id.into_inner()))
        .order_by_asc(working_day_policies::Column::EffectiveFrom)
        .all(conn)
        .await?
        .into_iter()
        .map(policy_from_model)
        .collect())
}

/// The overlap error for `policy` against `existing`, or the original
/// database error when nothing stored conflicts.
fn recheck_policy(
    policy: &WorkingDayPolicy,
    existing: &[WorkingDayPolicy],
    err: DbErr,
) -> CalendarRepoError {
    match PolicyService::validate_new_policy(policy, existing) {
        Err(e) => e.into(),
        Ok(()) => err.into(),
    }
}

fn policy_from_model(model: working_day_policies::Model) -> WorkingDayPolicy {
    WorkingDayPolicy {
        id: WorkingDayPolicyId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        sunday_off: model.sunday_off,
        saturday_off_pattern: model.saturday_off_pattern.into(),
        effective_from: model.effective_from,
        effective_to: model.effective_to,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn holiday_from_model(model: holidays::Model) -> Holiday {
    Holiday {
        id: HolidayId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        start_date: model.start_date,
        end_date: model.end_date,
        holiday_type: model.holiday_type.into(),
        description: model.description,
    }
}

fn exception_from_model(
    model: calendar_exceptions::Model,
    classes: BTreeSet<ClassId>,
) -> CalendarException {
    CalendarException {
        id: CalendarExceptionId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        date: model.date,
        override_type: model.override_type.into(),
        is_applicable_to_all_classes: model.is_applicable_to_all_classes,
        classes,
        reason: model.reason,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
