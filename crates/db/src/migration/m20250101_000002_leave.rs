//! Leave migration.
//!
//! Creates leave types, allocations, balances and requests. Overlapping
//! pending/approved requests of one user are rejected by an exclusion
//! constraint, whatever the engine checked beforehand.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(LEAVE_TYPES_SQL).await?;
        db.execute_unprepared(LEAVE_ALLOCATIONS_SQL).await?;
        db.execute_unprepared(LEAVE_BALANCES_SQL).await?;
        db.execute_unprepared(LEAVE_REQUESTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE leave_status AS ENUM ('PENDING', 'APPROVED', 'REJECTED', 'CANCELLED');
";

const LEAVE_TYPES_SQL: &str = r"
CREATE TABLE leave_types (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    name VARCHAR(100) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_leave_type_name UNIQUE (organization_id, name)
);
";

const LEAVE_ALLOCATIONS_SQL: &str = r"
CREATE TABLE leave_allocations (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    leave_type_id UUID NOT NULL REFERENCES leave_types(id),
    total_days NUMERIC(6, 1) NOT NULL,
    max_carry_forward_days NUMERIC(6, 1) NOT NULL DEFAULT 0,
    effective_from DATE NOT NULL,
    effective_to DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_allocation_days CHECK (total_days >= 0 AND max_carry_forward_days >= 0),
    CONSTRAINT chk_allocation_carry CHECK (max_carry_forward_days <= total_days),
    CONSTRAINT chk_allocation_period CHECK (effective_to IS NULL OR effective_to >= effective_from)
);

CREATE INDEX idx_allocations_org ON leave_allocations(organization_id, effective_from);

CREATE TABLE leave_allocation_roles (
    leave_allocation_id UUID NOT NULL REFERENCES leave_allocations(id) ON DELETE CASCADE,
    role_id UUID NOT NULL,
    PRIMARY KEY (leave_allocation_id, role_id)
);
";

const LEAVE_BALANCES_SQL: &str = r"
CREATE TABLE leave_balances (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    leave_allocation_id UUID NOT NULL REFERENCES leave_allocations(id),
    total_allocated NUMERIC(6, 1) NOT NULL,
    used NUMERIC(6, 1) NOT NULL DEFAULT 0,
    pending NUMERIC(6, 1) NOT NULL DEFAULT 0,
    carried_forward NUMERIC(6, 1) NOT NULL DEFAULT 0,
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_balance_user_allocation UNIQUE (user_id, leave_allocation_id),
    CONSTRAINT chk_balance_non_negative CHECK (
        total_allocated >= 0 AND used >= 0 AND pending >= 0 AND carried_forward >= 0
    )
);

CREATE INDEX idx_balances_user ON leave_balances(user_id);
";

const LEAVE_REQUESTS_SQL: &str = r"
CREATE TABLE leave_requests (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    leave_balance_id UUID NOT NULL REFERENCES leave_balances(id),
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    number_of_days NUMERIC(6, 1) NOT NULL,
    is_half_day BOOLEAN NOT NULL DEFAULT FALSE,
    status leave_status NOT NULL DEFAULT 'PENDING',
    reason TEXT NOT NULL DEFAULT '',
    reviewed_by UUID,
    reviewed_at TIMESTAMPTZ,
    review_comment TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_request_range CHECK (end_date >= start_date),
    CONSTRAINT chk_request_days CHECK (number_of_days > 0),
    CONSTRAINT excl_request_overlap EXCLUDE USING gist (
        user_id WITH =,
        daterange(start_date, end_date, '[]') WITH &&
    ) WHERE (status IN ('PENDING', 'APPROVED'))
);

CREATE INDEX idx_requests_user_range ON leave_requests(user_id, start_date, end_date);
CREATE INDEX idx_requests_balance ON leave_requests(leave_balance_id);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS leave_requests CASCADE;
DROP TABLE IF EXISTS leave_balances CASCADE;
DROP TABLE IF EXISTS leave_allocation_roles CASCADE;
DROP TABLE IF EXISTS leave_allocations CASCADE;
DROP TABLE IF EXISTS leave_types CASCADE;
DROP TYPE IF EXISTS leave_status;
";
