//! Attendance repository: one record per student per day.

use crate::entities::{attendance_records, prelude::*};
use crate::models::{SaveAttendance, new_id};
use chrono::NaiveDate;
use sea_orm::*;

/// Insert or replace the record for the entry's student and date.
pub async fn upsert<C: ConnectionTrait>(
    db: &C,
    school_id: &str,
    recorded_by: Option<&str>,
    entry: &SaveAttendance,
) -> Result<attendance_records::Model, DbErr> {
    let existing = AttendanceRecords::find()
        .filter(attendance_records::Column::StudentId.eq(entry.student_id.as_str()))
        .filter(attendance_records::Column::Date.eq(entry.date))
        .one(db)
        .await?;

    match existing {
        Some(model) => {
            let mut active: attendance_records::ActiveModel = model.into();
            active.status = Set(entry.status);
            active.behavior_status = Set(entry.behavior_status);
            active.excuse_note = Set(entry.excuse_note.clone());
            if let Some(by) = recorded_by {
                active.created_by_id = Set(Some(by.to_string()));
            }
            active.update(db).await
        }
        None => {
            let model = attendance_records::ActiveModel {
                id: Set(new_id()),
                school_id: Set(school_id.to_string()),
                student_id: Set(entry.student_id.clone()),
                date: Set(entry.date),
                status: Set(entry.status),
                behavior_status: Set(entry.behavior_status),
                excuse_note: Set(entry.excuse_note.clone()),
                created_by_id: Set(recorded_by.map(str::to_string)),
            };
            model.insert(db).await
        }
    }
}

/// Get a school's attendance within a date range (inclusive).
pub async fn list_by_school(
    db: &DatabaseConnection,
    school_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<attendance_records::Model>, DbErr> {
    AttendanceRecords::find()
        .filter(attendance_records::Column::SchoolId.eq(school_id))
        .filter(attendance_records::Column::Date.between(start_date, end_date))
        .order_by_desc(attendance_records::Column::Date)
        .all(db)
        .await
}

/// Get one student's attendance within a date range (inclusive).
pub async fn list_by_student(
    db: &DatabaseConnection,
    student_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<attendance_records::Model>, DbErr> {
    AttendanceRecords::find()
        .filter(attendance_records::Column::StudentId.eq(student_id))
        .filter(attendance_records::Column::Date.between(start_date, end_date))
        .order_by_desc(attendance_records::Column::Date)
        .all(db)
        .await
}

/// Get the records of the given students within a date range.
pub async fn list_for_students(
    db: &DatabaseConnection,
    student_ids: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<attendance_records::Model>, DbErr> {
    if student_ids.is_empty() {
        return Ok(Vec::new());
    }
    AttendanceRecords::find()
        .filter(attendance_records::Column::StudentId.is_in(student_ids.iter().cloned()))
        .filter(attendance_records::Column::Date.between(start_date, end_date))
        .order_by_asc(attendance_records::Column::Date)
        .all(db)
        .await
}

/// Delete an attendance record by ID.
pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<bool, DbErr> {
    let result = AttendanceRecords::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Delete every record of a student. Returns the deleted ids.
pub async fn delete_by_student<C: ConnectionTrait>(db: &C, student_id: &str) -> Result<Vec<String>, DbErr> {
    let ids: Vec<String> = AttendanceRecords::find()
        .select_only()
        .column(attendance_records::Column::Id)
        .filter(attendance_records::Column::StudentId.eq(student_id))
        .into_tuple()
        .all(db)
        .await?;

    if !ids.is_empty() {
        AttendanceRecords::delete_many()
            .filter(attendance_records::Column::StudentId.eq(student_id))
            .exec(db)
            .await?;
    }
    Ok(ids)
}
