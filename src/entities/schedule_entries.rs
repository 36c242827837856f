use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Weekly timetable slot.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedule_entries")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub school_id: String,
    pub teacher_id: String,
    pub class_name: String,
    pub subject: String,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: i32,
    pub period: i32,
    pub start_time: Time,
    pub end_time: Time,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
