//! `SeaORM` Entity for calendar_exception_classes table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "calendar_exception_classes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub calendar_exception_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub class_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::calendar_exceptions::Entity",
        from = "Column::CalendarExceptionId",
        to = "super::calendar_exceptions::Column::Id",
        on_delete = "Cascade"
    )]
    CalendarExceptions,
}

impl Related<super::calendar_exceptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CalendarExceptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
