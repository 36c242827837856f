//! Whole-collection replace and JSON access used by remote sync and the
//! JSON export.
//!
//! Records cross the wire as the entity models' serde form, so decoding a
//! remote collection is a plain `serde_json` conversion into `Model`s.

use crate::entities::prelude::*;
use crate::entities::{
    attendance_records, exams, messages, performance_records, schedule_entries, schools, students, terms, users,
};
use crate::error::Result;
use crate::events::Collection;
use sea_orm::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Rows per INSERT statement; keeps well under SQLite's bind limit.
const INSERT_CHUNK: usize = 50;

/// Overwrite a local table with the given remote records.
///
/// Decoding happens before anything is deleted, so a malformed payload
/// leaves the table untouched.
pub async fn replace_collection<C: ConnectionTrait>(db: &C, collection: Collection, records: Vec<Value>) -> Result<usize> {
    match collection {
        Collection::Schools => replace_all::<schools::ActiveModel, _>(db, records).await,
        Collection::Users => replace_all::<users::ActiveModel, _>(db, records).await,
        Collection::Students => replace_all::<students::ActiveModel, _>(db, records).await,
        Collection::Attendance => {
            replace_all::<attendance_records::ActiveModel, _>(db, last_per_student_day(records)).await
        }
        Collection::Performance => replace_all::<performance_records::ActiveModel, _>(db, records).await,
        Collection::Terms => replace_all::<terms::ActiveModel, _>(db, records).await,
        Collection::Messages => replace_all::<messages::ActiveModel, _>(db, records).await,
        Collection::Schedule => replace_all::<schedule_entries::ActiveModel, _>(db, records).await,
        Collection::Exams => replace_all::<exams::ActiveModel, _>(db, records).await,
    }
}

/// Load one record as wire JSON.
pub async fn load_record(db: &DatabaseConnection, collection: Collection, id: &str) -> Result<Option<Value>> {
    match collection {
        Collection::Schools => load::<Schools>(db, id).await,
        Collection::Users => load::<Users>(db, id).await,
        Collection::Students => load::<Students>(db, id).await,
        Collection::Attendance => load::<AttendanceRecords>(db, id).await,
        Collection::Performance => load::<PerformanceRecords>(db, id).await,
        Collection::Terms => load::<Terms>(db, id).await,
        Collection::Messages => load::<Messages>(db, id).await,
        Collection::Schedule => load::<ScheduleEntries>(db, id).await,
        Collection::Exams => load::<Exams>(db, id).await,
    }
}

/// Dump a whole table as wire JSON.
pub async fn dump_collection(db: &DatabaseConnection, collection: Collection) -> Result<Vec<Value>> {
    match collection {
        Collection::Schools => dump::<Schools>(db).await,
        Collection::Users => dump::<Users>(db).await,
        Collection::Students => dump::<Students>(db).await,
        Collection::Attendance => dump::<AttendanceRecords>(db).await,
        Collection::Performance => dump::<PerformanceRecords>(db).await,
        Collection::Terms => dump::<Terms>(db).await,
        Collection::Messages => dump::<Messages>(db).await,
        Collection::Schedule => dump::<ScheduleEntries>(db).await,
        Collection::Exams => dump::<Exams>(db).await,
    }
}

/// Keep only the last attendance record per (student, date); the local
/// table allows one.
fn last_per_student_day(records: Vec<Value>) -> Vec<Value> {
    let key = |r: &Value| -> Option<(String, String)> {
        Some((r.get("studentId")?.as_str()?.to_string(), r.get("date")?.as_str()?.to_string()))
    };

    let mut last: HashMap<(String, String), usize> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        if let Some(k) = key(record) {
            last.insert(k, idx);
        }
    }

    let mut kept = Vec::with_capacity(last.len());
    let mut dropped = Vec::new();
    for (idx, record) in records.into_iter().enumerate() {
        match key(&record) {
            Some(k) if last.get(&k) != Some(&idx) => {
                dropped.push(record.get("id").and_then(Value::as_str).unwrap_or("?").to_string());
            }
            _ => kept.push(record),
        }
    }
    if !dropped.is_empty() {
        warn!(
            "Dropped {} duplicate attendance records from remote: {}",
            dropped.len(),
            dropped.join(", ")
        );
    }
    kept
}

async fn replace_all<A, C>(db: &C, records: Vec<Value>) -> Result<usize>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + Send,
    <A::Entity as EntityTrait>::Model: DeserializeOwned + IntoActiveModel<A>,
{
    let models = records
        .into_iter()
        .map(serde_json::from_value::<<A::Entity as EntityTrait>::Model>)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let count = models.len();

    <A::Entity as EntityTrait>::delete_many().exec(db).await?;

    let mut batch: Vec<A> = Vec::with_capacity(INSERT_CHUNK);
    for model in models {
        batch.push(insertable(model));
        if batch.len() == INSERT_CHUNK {
            <A::Entity as EntityTrait>::insert_many(std::mem::take(&mut batch))
                .exec_without_returning(db)
                .await?;
        }
    }
    if !batch.is_empty() {
        <A::Entity as EntityTrait>::insert_many(batch)
            .exec_without_returning(db)
            .await?;
    }

    Ok(count)
}

/// Convert a loaded model into an active model with every column set.
fn insertable<A>(model: <A::Entity as EntityTrait>::Model) -> A
where
    A: ActiveModelTrait,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    let mut active = model.into_active_model();
    for col in <A::Entity as EntityTrait>::Column::iter() {
        if let ActiveValue::Unchanged(value) = active.take(col) {
            active.set(col, value);
        }
    }
    active
}

async fn load<E>(db: &DatabaseConnection, id: &str) -> Result<Option<Value>>
where
    E: EntityTrait,
    E::Model: Serialize,
    String: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    let model = E::find_by_id(id.to_string()).one(db).await?;
    model.map(|m| serde_json::to_value(m).map_err(Into::into)).transpose()
}

async fn dump<E>(db: &DatabaseConnection) -> Result<Vec<Value>>
where
    E: EntityTrait,
    E::Model: Serialize,
{
    let models = E::find().all(db).await?;
    models
        .into_iter()
        .map(|m| serde_json::to_value(m).map_err(Into::into))
        .collect()
}
