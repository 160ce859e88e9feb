//! Calendar migration.
//!
//! Creates working day policies, stored holidays and calendar exceptions.
//! Weekend holidays are computed at query time and have no table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(EXTENSIONS_SQL).await?;
        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(WORKING_DAY_POLICIES_SQL).await?;
        db.execute_unprepared(HOLIDAYS_SQL).await?;
        db.execute_unprepared(CALENDAR_EXCEPTIONS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const EXTENSIONS_SQL: &str = r"
-- Needed for equality on UUID columns inside GiST exclusion constraints
CREATE EXTENSION IF NOT EXISTS btree_gist;
";

const ENUMS_SQL: &str = r"
CREATE TYPE saturday_off_pattern AS ENUM (
    'NONE', 'SECOND_ONLY', 'SECOND_AND_FOURTH', 'ALL'
);

CREATE TYPE holiday_type AS ENUM (
    'SUNDAY', 'SATURDAY', 'SECOND_SATURDAY', 'NATIONAL_HOLIDAY',
    'FESTIVAL', 'ORGANIZATION_HOLIDAY', 'OTHER'
);

CREATE TYPE override_type AS ENUM ('FORCE_WORKING', 'FORCE_HOLIDAY');
";

const WORKING_DAY_POLICIES_SQL: &str = r"
CREATE TABLE working_day_policies (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    sunday_off BOOLEAN NOT NULL DEFAULT TRUE,
    saturday_off_pattern saturday_off_pattern NOT NULL DEFAULT 'NONE',
    effective_from DATE NOT NULL,
    effective_to DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_policy_period CHECK (effective_to IS NULL OR effective_to >= effective_from),
    -- At most one policy in force per organization per day
    CONSTRAINT excl_policy_period EXCLUDE USING gist (
        organization_id WITH =,
        daterange(effective_from, effective_to, '[]') WITH &&
    )
);

CREATE INDEX idx_policies_org ON working_day_policies(organization_id, effective_from);
";

const HOLIDAYS_SQL: &str = r"
CREATE TABLE holidays (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    holiday_type holiday_type NOT NULL,
    description TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_holiday_range CHECK (end_date >= start_date),
    -- Weekend holidays are derived from the policy, never stored
    CONSTRAINT chk_holiday_not_weekend CHECK (holiday_type NOT IN ('SUNDAY', 'SATURDAY')),
    CONSTRAINT chk_holiday_description CHECK (length(trim(description)) > 0)
);

CREATE INDEX idx_holidays_org_range ON holidays(organization_id, start_date, end_date);
";

const CALENDAR_EXCEPTIONS_SQL: &str = r"
CREATE TABLE calendar_exceptions (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    date DATE NOT NULL,
    override_type override_type NOT NULL,
    is_applicable_to_all_classes BOOLEAN NOT NULL DEFAULT TRUE,
    reason TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_exceptions_org_date ON calendar_exceptions(organization_id, date);

CREATE TABLE calendar_exception_classes (
    calendar_exception_id UUID NOT NULL REFERENCES calendar_exceptions(id) ON DELETE CASCADE,
    class_id UUID NOT NULL,
    PRIMARY KEY (calendar_exception_id, class_id)
);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS calendar_exception_classes CASCADE;
DROP TABLE IF EXISTS calendar_exceptions CASCADE;
DROP TABLE IF EXISTS holidays CASCADE;
DROP TABLE IF EXISTS working_day_policies CASCADE;
DROP TYPE IF EXISTS override_type;
DROP TYPE IF EXISTS holiday_type;
DROP TYPE IF EXISTS saturday_off_pattern;
";
