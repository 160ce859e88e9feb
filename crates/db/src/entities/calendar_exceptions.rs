//! `SeaORM` Entity for calendar_exceptions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::OverrideType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "calendar_exceptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub date: Date,
    pub override_type: OverrideType,
    pub is_applicable_to_all_classes: bool,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::calendar_exception_classes::Entity")]
    CalendarExceptionClasses,
}

impl Related<super::calendar_exception_classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CalendarExceptionClasses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
