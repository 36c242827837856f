//! Exam repository.

use crate::entities::{exams, prelude::*};
use crate::models::{CreateExam, new_id};
use chrono::NaiveDate;
use sea_orm::*;

/// List a school's exams by date.
pub async fn list_by_school(db: &DatabaseConnection, school_id: &str) -> Result<Vec<exams::Model>, DbErr> {
    Exams::find()
        .filter(exams::Column::SchoolId.eq(school_id))
        .order_by_asc(exams::Column::Date)
        .all(db)
        .await
}

/// Exams of a class on or after `from`, soonest first.
pub async fn upcoming(
    db: &DatabaseConnection,
    school_id: &str,
    class_name: &str,
    from: NaiveDate,
) -> Result<Vec<exams::Model>, DbErr> {
    Exams::find()
        .filter(exams::Column::SchoolId.eq(school_id))
        .filter(exams::Column::ClassName.eq(class_name))
        .filter(exams::Column::Date.gte(from))
        .order_by_asc(exams::Column::Date)
        .all(db)
        .await
}

pub async fn create(db: &DatabaseConnection, data: CreateExam) -> Result<exams::Model, DbErr> {
    let model = exams::ActiveModel {
        id: Set(new_id()),
        school_id: Set(data.school_id),
        term_id: Set(data.term_id),
        class_name: Set(data.class_name),
        subject: Set(data.subject),
        title: Set(data.title),
        date: Set(data.date),
        max_score: Set(data.max_score),
        duration_minutes: Set(data.duration_minutes),
    };
    model.insert(db).await
}

pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<bool, DbErr> {
    let result = Exams::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}
