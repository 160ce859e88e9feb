//! `SeaORM` Entity for leave_allocations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub leave_type_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub total_days: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub max_carry_forward_days: Decimal,
    pub effective_from: Date,
    pub effective_to: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::leave_types::Entity",
        from = "Column::LeaveTypeId",
        to = "super::leave_types::Column::Id"
    )]
    LeaveTypes,
    #[sea_orm(has_many = "super::leave_allocation_roles::Entity")]
    LeaveAllocationRoles,
    #[sea_orm(has_many = "super::leave_balances::Entity")]
    LeaveBalances,
}

impl Related<super::leave_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveTypes.def()
    }
}

impl Related<super::leave_allocation_roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveAllocationRoles.def()
    }
}

impl Related<super::leave_balances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveBalances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
