//! Timetable repository.

use crate::entities::{prelude::*, schedule_entries};
use crate::models::{CreateScheduleEntry, new_id};
use sea_orm::*;

/// A teacher's weekly slots ordered by day and period.
pub async fn list_by_teacher(
    db: &DatabaseConnection,
    teacher_id: &str,
) -> Result<Vec<schedule_entries::Model>, DbErr> {
    ScheduleEntries::find()
        .filter(schedule_entries::Column::TeacherId.eq(teacher_id))
        .order_by_asc(schedule_entries::Column::DayOfWeek)
        .order_by_asc(schedule_entries::Column::Period)
        .all(db)
        .await
}

/// A class's weekly slots ordered by day and period.
pub async fn list_by_class(
    db: &DatabaseConnection,
    school_id: &str,
    class_name: &str,
) -> Result<Vec<schedule_entries::Model>, DbErr> {
    ScheduleEntries::find()
        .filter(schedule_entries::Column::SchoolId.eq(school_id))
        .filter(schedule_entries::Column::ClassName.eq(class_name))
        .order_by_asc(schedule_entries::Column::DayOfWeek)
        .order_by_asc(schedule_entries::Column::Period)
        .all(db)
        .await
}

/// Slots sharing the candidate's day and period (teacher or class clash candidates).
pub async fn list_same_slot(
    db: &DatabaseConnection,
    school_id: &str,
    day_of_week: i32,
    period: i32,
) -> Result<Vec<schedule_entries::Model>, DbErr> {
    ScheduleEntries::find()
        .filter(schedule_entries::Column::SchoolId.eq(school_id))
        .filter(schedule_entries::Column::DayOfWeek.eq(day_of_week))
        .filter(schedule_entries::Column::Period.eq(period))
        .all(db)
        .await
}

pub async fn create(db: &DatabaseConnection, data: CreateScheduleEntry) -> Result<schedule_entries::Model, DbErr> {
    let model = schedule_entries::ActiveModel {
        id: Set(new_id()),
        school_id: Set(data.school_id),
        teacher_id: Set(data.teacher_id),
        class_name: Set(data.class_name),
        subject: Set(data.subject),
        day_of_week: Set(data.day_of_week),
        period: Set(data.period),
        start_time: Set(data.start_time),
        end_time: Set(data.end_time),
    };
    model.insert(db).await
}

pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<bool, DbErr> {
    let result = ScheduleEntries::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}
