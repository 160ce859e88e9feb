//! `SeaORM` Entity for leave_allocation_roles table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_allocation_roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub leave_allocation_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub role_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::leave_allocations::Entity",
        from = "Column::LeaveAllocationId",
        to = "super::leave_allocations::Column::Id",
        on_delete = "Cascade"
    )]
    LeaveAllocations,
}

impl Related<super::leave_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
