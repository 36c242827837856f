use super::sea_orm_active_enums::{AttendanceStatus, BehaviorStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per student per school day.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_records")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub school_id: String,
    pub student_id: String,
    pub date: Date,
    pub status: AttendanceStatus,
    pub behavior_status: Option<BehaviorStatus>,
    pub excuse_note: Option<String>,
    pub created_by_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
