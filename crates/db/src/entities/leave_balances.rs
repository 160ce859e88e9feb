//! `SeaORM` Entity for leave_balances table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub leave_allocation_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub total_allocated: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub used: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub pending: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub carried_forward: Decimal,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::leave_allocations::Entity",
        from = "Column::LeaveAllocationId",
        to = "super::leave_allocations::Column::Id"
    )]
    LeaveAllocations,
    #[sea_orm(has_many = "super::leave_requests::Entity")]
    LeaveRequests,
}

impl Related<super::leave_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveAllocations.def()
    }
}

impl Related<super::leave_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
