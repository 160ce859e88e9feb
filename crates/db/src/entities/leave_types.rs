//! `SeaORM` Entity for leave_types table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::leave_allocations::Entity")]
    LeaveAllocations,
}

impl Related<super::leave_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
