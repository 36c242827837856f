//! Performance record repository.

use crate::entities::{performance_records, prelude::*};
use crate::models::{CreatePerformance, UpdatePerformance, new_id};
use chrono::NaiveDate;
use sea_orm::*;

/// Get one student's records within a date range, oldest first.
pub async fn list_by_student(
    db: &DatabaseConnection,
    student_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<performance_records::Model>, DbErr> {
    PerformanceRecords::find()
        .filter(performance_records::Column::StudentId.eq(student_id))
        .filter(performance_records::Column::Date.between(start_date, end_date))
        .order_by_asc(performance_records::Column::Date)
        .all(db)
        .await
}

/// Get the records of the given students within a date range.
pub async fn list_for_students(
    db: &DatabaseConnection,
    student_ids: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<performance_records::Model>, DbErr> {
    if student_ids.is_empty() {
        return Ok(Vec::new());
    }
    PerformanceRecords::find()
        .filter(performance_records::Column::StudentId.is_in(student_ids.iter().cloned()))
        .filter(performance_records::Column::Date.between(start_date, end_date))
        .order_by_asc(performance_records::Column::Date)
        .all(db)
        .await
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<performance_records::Model>, DbErr> {
    PerformanceRecords::find_by_id(id).one(db).await
}

/// Create a new performance record.
pub async fn create(db: &DatabaseConnection, data: CreatePerformance) -> Result<performance_records::Model, DbErr> {
    let model = performance_records::ActiveModel {
        id: Set(new_id()),
        school_id: Set(data.school_id),
        student_id: Set(data.student_id),
        subject: Set(data.subject),
        title: Set(data.title),
        score: Set(data.score),
        max_score: Set(data.max_score),
        category: Set(data.category),
        date: Set(data.date),
        notes: Set(data.notes),
        created_by_id: Set(data.created_by_id),
    };
    model.insert(db).await
}

/// Apply an update to a loaded record.
pub async fn update(
    db: &DatabaseConnection,
    model: performance_records::Model,
    data: UpdatePerformance,
) -> Result<performance_records::Model, DbErr> {
    let mut active: performance_records::ActiveModel = model.into();

    if let Some(subject) = data.subject {
        active.subject = Set(subject);
    }
    if let Some(title) = data.title {
        active.title = Set(title);
    }
    if let Some(score) = data.score {
        active.score = Set(score);
    }
    if let Some(max_score) = data.max_score {
        active.max_score = Set(max_score);
    }
    if let Some(category) = data.category {
        active.category = Set(category);
    }
    if let Some(date) = data.date {
        active.date = Set(date);
    }
    if let Some(notes) = data.notes {
        active.notes = Set(notes);
    }

    active.update(db).await
}

/// Delete a performance record by ID.
pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<bool, DbErr> {
    let result = PerformanceRecords::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Delete every record of a student. Returns the deleted ids.
pub async fn delete_by_student<C: ConnectionTrait>(db: &C, student_id: &str) -> Result<Vec<String>, DbErr> {
    let ids: Vec<String> = PerformanceRecords::find()
        .select_only()
        .column(performance_records::Column::Id)
        .filter(performance_records::Column::StudentId.eq(student_id))
        .into_tuple()
        .all(db)
        .await?;

    if !ids.is_empty() {
        PerformanceRecords::delete_many()
            .filter(performance_records::Column::StudentId.eq(student_id))
            .exec(db)
            .await?;
    }
    Ok(ids)
}
