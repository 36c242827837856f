//! Storage service: the single collaborator every front end talks to.
//!
//! Wraps the local SQLite store with per-entity getters and setters,
//! validates input, and publishes a [`DataChange`] after every committed
//! mutation. Sync status is exposed through the same event bus.

use crate::access::normalize_phone;
use crate::config::DatabaseConfig;
use crate::db;
use crate::entities::sea_orm_active_enums::MessageStatus;
use crate::entities::{
    attendance_records, exams, messages, performance_records, schedule_entries, schools, students, terms, users,
};
use crate::error::{AppError, Result};
use crate::events::{Collection, DataChange, EventBus, SyncStatus};
use crate::models::performance::validate_score;
use crate::models::term::validate_term_dates;
use crate::models::{
    CreateExam, CreateMessage, CreatePerformance, CreateSchool, CreateScheduleEntry, CreateStudent, CreateTerm,
    CreateUser, SaveAttendance, UpdatePerformance, UpdateStudent, UpdateTerm, UpdateUser, optional, required,
};
use crate::stats::DateRange;
use crate::timetable;
use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

#[cfg(test)]
mod tests;

/// Local-first data store with change notifications.
#[derive(Clone)]
pub struct StorageService {
    db: DatabaseConnection,
    events: EventBus,
}

impl StorageService {
    pub fn new(db: DatabaseConnection, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Connect to the configured database and create missing tables.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let db = db::connect(&config.connection_string(), config.max_connections).await?;
        info!("Local store opened at {}", config.path.display());
        Ok(Self::new(db, EventBus::new()))
    }

    /// Fresh in-memory store.
    pub async fn open_in_memory() -> Result<Self> {
        let db = db::connect("sqlite::memory:", 1).await?;
        Ok(Self::new(db, EventBus::new()))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe_to_data_changes(&self) -> broadcast::Receiver<DataChange> {
        self.events.subscribe_to_data_changes()
    }

    pub fn subscribe_to_sync_status(&self) -> watch::Receiver<SyncStatus> {
        self.events.subscribe_to_sync_status()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.events.status()
    }

    fn upserted(&self, collection: Collection, id: &str) {
        debug!("{collection} {id} upserted");
        self.events.publish(DataChange::upserted(collection, id));
    }

    fn deleted(&self, collection: Collection, id: &str) {
        debug!("{collection} {id} deleted");
        self.events.publish(DataChange::deleted(collection, id));
    }

    pub async fn table_counts(&self) -> Result<db::TableCounts> {
        Ok(db::get_table_counts(&self.db).await?)
    }

    /// Every collection as wire JSON, keyed by collection path.
    pub async fn export_json(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        let mut out = serde_json::Map::new();
        for collection in Collection::ALL {
            let records = db::snapshot::dump_collection(&self.db, collection).await?;
            out.insert(collection.path().to_string(), serde_json::Value::Array(records));
        }
        Ok(out)
    }

    // Schools

    pub async fn get_schools(&self) -> Result<Vec<schools::Model>> {
        Ok(db::schools::list_all(&self.db).await?)
    }

    pub async fn get_school(&self, id: &str) -> Result<Option<schools::Model>> {
        Ok(db::schools::get_by_id(&self.db, id).await?)
    }

    pub async fn add_school(&self, mut data: CreateSchool) -> Result<schools::Model> {
        data.name = required("School name", &data.name)?;
        data.region = optional(data.region.as_deref());
        let school = db::schools::create(&self.db, data).await?;
        self.upserted(Collection::Schools, &school.id);
        Ok(school)
    }

    pub async fn delete_school(&self, id: &str) -> Result<bool> {
        let removed = db::schools::delete(&self.db, id).await?;
        if removed {
            self.deleted(Collection::Schools, id);
        }
        Ok(removed)
    }

    // Accounts

    pub async fn get_users(&self, school_id: &str) -> Result<Vec<users::Model>> {
        Ok(db::users::list_by_school(&self.db, school_id).await?)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<users::Model>> {
        Ok(db::users::get_by_id(&self.db, id).await?)
    }

    /// Portal login lookup by phone or national id. Phones match in any
    /// notation, so `+966 50...` finds an account stored as `00966 50...`.
    pub async fn find_user_by_login(&self, identifier: &str) -> Result<Option<users::Model>> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(None);
        }
        if let Some(user) = db::users::find_by_login(&self.db, identifier).await? {
            return Ok(Some(user));
        }

        let wanted = normalize_phone(identifier);
        if wanted.is_empty() {
            return Ok(None);
        }
        let with_phone = db::users::list_with_phone(&self.db).await?;
        Ok(with_phone
            .into_iter()
            .find(|u| u.phone.as_deref().is_some_and(|p| normalize_phone(p) == wanted)))
    }

    pub async fn add_user(&self, mut data: CreateUser) -> Result<users::Model> {
        data.validate()?;
        data.name = data.name.trim().to_string();
        data.phone = optional(data.phone.as_deref());
        data.national_id = optional(data.national_id.as_deref());
        let user = db::users::create(&self.db, data).await?;
        self.upserted(Collection::Users, &user.id);
        Ok(user)
    }

    /// Partial update; the merged account must still pass the create rules.
    pub async fn update_user(&self, id: &str, mut data: UpdateUser) -> Result<users::Model> {
        let existing = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {id}")))?;
        data.name = data.name.as_deref().map(|n| required("Name", n)).transpose()?;
        data.phone = data.phone.map(|p| optional(p.as_deref()));
        data.national_id = data.national_id.map(|n| optional(n.as_deref()));

        let merged = CreateUser {
            school_id: existing.school_id,
            name: data.name.clone().unwrap_or(existing.name),
            role: data.role.unwrap_or(existing.role),
            phone: data.phone.clone().unwrap_or(existing.phone),
            national_id: data.national_id.clone().unwrap_or(existing.national_id),
            assigned_classes: Vec::new(),
        };
        merged.validate()?;

        let user = db::users::update(&self.db, id, data)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {id}")))?;
        self.upserted(Collection::Users, &user.id);
        Ok(user)
    }

    pub async fn delete_user(&self, id: &str) -> Result<bool> {
        let removed = db::users::delete(&self.db, id).await?;
        if removed {
            self.deleted(Collection::Users, id);
        }
        Ok(removed)
    }

    // Students

    pub async fn get_students(&self, school_id: &str) -> Result<Vec<students::Model>> {
        Ok(db::students::list_by_school(&self.db, school_id).await?)
    }

    pub async fn get_students_by_class(&self, school_id: &str, class_name: &str) -> Result<Vec<students::Model>> {
        Ok(db::students::list_by_class(&self.db, school_id, class_name).await?)
    }

    pub async fn get_student(&self, id: &str) -> Result<Option<students::Model>> {
        Ok(db::students::get_by_id(&self.db, id).await?)
    }

    pub async fn search_students(&self, school_id: &str, query: &str) -> Result<Vec<students::Model>> {
        let query = query.trim();
        if query.is_empty() {
            return self.get_students(school_id).await;
        }
        Ok(db::students::search(&self.db, school_id, query).await?)
    }

    pub async fn class_names(&self, school_id: &str) -> Result<Vec<String>> {
        Ok(db::students::class_names(&self.db, school_id).await?)
    }

    pub async fn add_student(&self, mut data: CreateStudent) -> Result<students::Model> {
        data.name = required("Name", &data.name)?;
        data.national_id = required("National id", &data.national_id)?;
        data.class_name = required("Class", &data.class_name)?;
        data.school_id = required("School", &data.school_id)?;
        data.parent_phone = optional(data.parent_phone.as_deref());

        if db::students::national_id_exists(&self.db, &data.school_id, &data.national_id, None).await? {
            return Err(AppError::validation(format!(
                "National id {} is already registered",
                data.national_id
            )));
        }

        let student = db::students::create(&self.db, data).await?;
        self.upserted(Collection::Students, &student.id);
        Ok(student)
    }

    pub async fn update_student(&self, id: &str, mut data: UpdateStudent) -> Result<students::Model> {
        let existing = self
            .get_student(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("student {id}")))?;

        data.name = data.name.as_deref().map(|n| required("Name", n)).transpose()?;
        data.class_name = data.class_name.as_deref().map(|c| required("Class", c)).transpose()?;
        data.national_id = data
            .national_id
            .as_deref()
            .map(|n| required("National id", n))
            .transpose()?;
        data.parent_phone = data.parent_phone.map(|p| optional(p.as_deref()));

        if let Some(national_id) = &data.national_id {
            if db::students::national_id_exists(&self.db, &existing.school_id, national_id, Some(id)).await? {
                return Err(AppError::validation(format!(
                    "National id {national_id} is already registered"
                )));
            }
        }

        let student = db::students::update(&self.db, id, data)
            .await?
            .ok_or_else(|| AppError::not_found(format!("student {id}")))?;
        self.upserted(Collection::Students, &student.id);
        Ok(student)
    }

    /// Delete a student together with their attendance and performance records.
    pub async fn delete_student(&self, id: &str) -> Result<bool> {
        let txn = self.db.begin().await?;
        let attendance_ids = db::attendance::delete_by_student(&txn, id).await?;
        let performance_ids = db::performance::delete_by_student(&txn, id).await?;
        let removed = db::students::delete(&txn, id).await?;
        txn.commit().await?;

        for record_id in &attendance_ids {
            self.deleted(Collection::Attendance, record_id);
        }
        for record_id in &performance_ids {
            self.deleted(Collection::Performance, record_id);
        }
        if removed {
            self.deleted(Collection::Students, id);
            info!(
                "Deleted student {id} with {} attendance and {} performance records",
                attendance_ids.len(),
                performance_ids.len()
            );
        }
        Ok(removed)
    }

    // Attendance

    pub async fn get_attendance(&self, school_id: &str, range: DateRange) -> Result<Vec<attendance_records::Model>> {
        Ok(db::attendance::list_by_school(&self.db, school_id, range.start, range.end).await?)
    }

    pub async fn get_student_attendance(
        &self,
        student_id: &str,
        range: DateRange,
    ) -> Result<Vec<attendance_records::Model>> {
        Ok(db::attendance::list_by_student(&self.db, student_id, range.start, range.end).await?)
    }

    /// Records of a class over a range.
    pub async fn get_class_attendance(
        &self,
        school_id: &str,
        class_name: &str,
        range: DateRange,
    ) -> Result<Vec<attendance_records::Model>> {
        let ids = self.class_student_ids(school_id, class_name).await?;
        Ok(db::attendance::list_for_students(&self.db, &ids, range.start, range.end).await?)
    }

    /// Records of a class on one day.
    pub async fn get_attendance_for_class(
        &self,
        school_id: &str,
        class_name: &str,
        date: NaiveDate,
    ) -> Result<Vec<attendance_records::Model>> {
        self.get_class_attendance(school_id, class_name, DateRange::new(date, date))
            .await
    }

    /// Save an attendance sheet; each entry replaces the student's record for
    /// that date. All entries are written in one transaction.
    pub async fn save_attendance(
        &self,
        school_id: &str,
        recorded_by: Option<&str>,
        entries: &[SaveAttendance],
    ) -> Result<Vec<attendance_records::Model>> {
        for entry in entries {
            let student = self
                .get_student(&entry.student_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("student {}", entry.student_id)))?;
            if student.school_id != school_id {
                return Err(AppError::validation(format!(
                    "Student {} does not belong to school {school_id}",
                    student.id
                )));
            }
        }

        let txn = self.db.begin().await?;
        let mut saved = Vec::with_capacity(entries.len());
        for entry in entries {
            saved.push(db::attendance::upsert(&txn, school_id, recorded_by, entry).await?);
        }
        txn.commit().await?;

        for record in &saved {
            self.upserted(Collection::Attendance, &record.id);
        }
        info!("Saved {} attendance records", saved.len());
        Ok(saved)
    }

    pub async fn delete_attendance(&self, id: &str) -> Result<bool> {
        let removed = db::attendance::delete(&self.db, id).await?;
        if removed {
            self.deleted(Collection::Attendance, id);
        }
        Ok(removed)
    }

    // Performance

    pub async fn get_performance(
        &self,
        student_id: &str,
        range: DateRange,
    ) -> Result<Vec<performance_records::Model>> {
        Ok(db::performance::list_by_student(&self.db, student_id, range.start, range.end).await?)
    }

    pub async fn get_class_performance(
        &self,
        school_id: &str,
        class_name: &str,
        range: DateRange,
    ) -> Result<Vec<performance_records::Model>> {
        let ids = self.class_student_ids(school_id, class_name).await?;
        Ok(db::performance::list_for_students(&self.db, &ids, range.start, range.end).await?)
    }

    pub async fn add_performance(&self, mut data: CreatePerformance) -> Result<performance_records::Model> {
        data.school_id = required("School", &data.school_id)?;
        data.subject = required("Subject", &data.subject)?;
        validate_score(data.score, data.max_score)?;
        let student = self
            .get_student(&data.student_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("student {}", data.student_id)))?;
        if student.school_id != data.school_id {
            return Err(AppError::validation(format!(
                "Student {} does not belong to school {}",
                student.id, data.school_id
            )));
        }
        data.title = optional(data.title.as_deref());

        let record = db::performance::create(&self.db, data).await?;
        self.upserted(Collection::Performance, &record.id);
        Ok(record)
    }

    pub async fn update_performance(&self, id: &str, mut data: UpdatePerformance) -> Result<performance_records::Model> {
        let existing = db::performance::get_by_id(&self.db, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("performance record {id}")))?;

        let score = data.score.unwrap_or(existing.score);
        let max_score = data.max_score.unwrap_or(existing.max_score);
        validate_score(score, max_score)?;
        data.subject = data.subject.as_deref().map(|s| required("Subject", s)).transpose()?;

        let record = db::performance::update(&self.db, existing, data).await?;
        self.upserted(Collection::Performance, &record.id);
        Ok(record)
    }

    pub async fn delete_performance(&self, id: &str) -> Result<bool> {
        let removed = db::performance::delete(&self.db, id).await?;
        if removed {
            self.deleted(Collection::Performance, id);
        }
        Ok(removed)
    }

    // Terms

    pub async fn get_terms(&self, school_id: &str) -> Result<Vec<terms::Model>> {
        Ok(db::terms::list_by_school(&self.db, school_id).await?)
    }

    pub async fn get_term(&self, id: &str) -> Result<Option<terms::Model>> {
        Ok(db::terms::get_by_id(&self.db, id).await?)
    }

    pub async fn current_term(&self, school_id: &str, today: NaiveDate) -> Result<Option<terms::Model>> {
        Ok(db::terms::current(&self.db, school_id, today).await?)
    }

    /// Add a term; flagging it current clears the flag on the school's other terms.
    pub async fn add_term(&self, mut data: CreateTerm) -> Result<terms::Model> {
        data.name = required("Term name", &data.name)?;
        validate_term_dates(data.start_date, data.end_date, &data.periods)?;

        let txn = self.db.begin().await?;
        let term = db::terms::create(&txn, data).await?;
        let cleared = if term.is_current {
            db::terms::clear_current_except(&txn, &term.school_id, &term.id).await?
        } else {
            Vec::new()
        };
        txn.commit().await?;

        for id in &cleared {
            self.upserted(Collection::Terms, id);
        }
        self.upserted(Collection::Terms, &term.id);
        Ok(term)
    }

    pub async fn update_term(&self, id: &str, mut data: UpdateTerm) -> Result<terms::Model> {
        let existing = self
            .get_term(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("term {id}")))?;

        data.name = data.name.as_deref().map(|n| required("Term name", n)).transpose()?;
        let start = data.start_date.unwrap_or(existing.start_date);
        let end = data.end_date.unwrap_or(existing.end_date);
        let periods = data.periods.as_deref().unwrap_or(&existing.periods.0);
        validate_term_dates(start, end, periods)?;

        let txn = self.db.begin().await?;
        let term = db::terms::update(&txn, existing, data).await?;
        let cleared = if term.is_current {
            db::terms::clear_current_except(&txn, &term.school_id, &term.id).await?
        } else {
            Vec::new()
        };
        txn.commit().await?;

        for id in &cleared {
            self.upserted(Collection::Terms, id);
        }
        self.upserted(Collection::Terms, &term.id);
        Ok(term)
    }

    pub async fn delete_term(&self, id: &str) -> Result<bool> {
        let removed = db::terms::delete(&self.db, id).await?;
        if removed {
            self.deleted(Collection::Terms, id);
        }
        Ok(removed)
    }

    // Messages

    pub async fn get_messages(&self, school_id: &str, student_id: Option<&str>) -> Result<Vec<messages::Model>> {
        Ok(db::messages::list(&self.db, school_id, student_id).await?)
    }

    pub async fn pending_messages(&self, school_id: &str) -> Result<Vec<messages::Model>> {
        Ok(db::messages::list_pending(&self.db, school_id).await?)
    }

    pub async fn queue_message(&self, mut data: CreateMessage) -> Result<messages::Model> {
        data.recipient_phone = required("Recipient phone", &data.recipient_phone)?;
        data.body = required("Message body", &data.body)?;

        let message = db::messages::create(&self.db, data).await?;
        self.upserted(Collection::Messages, &message.id);
        Ok(message)
    }

    pub async fn mark_message(&self, id: &str, status: MessageStatus) -> Result<messages::Model> {
        let message = db::messages::set_status(&self.db, id, status)
            .await?
            .ok_or_else(|| AppError::not_found(format!("message {id}")))?;
        self.upserted(Collection::Messages, &message.id);
        Ok(message)
    }

    // Schedule

    pub async fn get_schedule_for_teacher(&self, teacher_id: &str) -> Result<Vec<schedule_entries::Model>> {
        Ok(db::schedule::list_by_teacher(&self.db, teacher_id).await?)
    }

    pub async fn get_schedule_for_class(
        &self,
        school_id: &str,
        class_name: &str,
    ) -> Result<Vec<schedule_entries::Model>> {
        Ok(db::schedule::list_by_class(&self.db, school_id, class_name).await?)
    }

    /// Add a timetable slot, rejecting teacher or class double-booking.
    pub async fn add_schedule_entry(&self, mut data: CreateScheduleEntry) -> Result<schedule_entries::Model> {
        data.school_id = required("School", &data.school_id)?;
        data.teacher_id = required("Teacher", &data.teacher_id)?;
        data.class_name = required("Class", &data.class_name)?;
        data.subject = required("Subject", &data.subject)?;
        data.validate()?;
        let same_slot = db::schedule::list_same_slot(&self.db, &data.school_id, data.day_of_week, data.period).await?;
        if let Some(conflict) = timetable::find_conflict(&same_slot, &data) {
            return Err(AppError::validation(conflict.describe()));
        }

        let entry = db::schedule::create(&self.db, data).await?;
        self.upserted(Collection::Schedule, &entry.id);
        Ok(entry)
    }

    pub async fn delete_schedule_entry(&self, id: &str) -> Result<bool> {
        let removed = db::schedule::delete(&self.db, id).await?;
        if removed {
            self.deleted(Collection::Schedule, id);
        }
        Ok(removed)
    }

    // Exams

    pub async fn get_exams(&self, school_id: &str) -> Result<Vec<exams::Model>> {
        Ok(db::exams::list_by_school(&self.db, school_id).await?)
    }

    pub async fn upcoming_exams(&self, school_id: &str, class_name: &str, from: NaiveDate) -> Result<Vec<exams::Model>> {
        Ok(db::exams::upcoming(&self.db, school_id, class_name, from).await?)
    }

    pub async fn add_exam(&self, mut data: CreateExam) -> Result<exams::Model> {
        data.school_id = required("School", &data.school_id)?;
        data.class_name = required("Class", &data.class_name)?;
        data.subject = required("Subject", &data.subject)?;
        data.title = required("Title", &data.title)?;
        data.term_id = optional(data.term_id.as_deref());
        data.validate()?;
        let exam = db::exams::create(&self.db, data).await?;
        self.upserted(Collection::Exams, &exam.id);
        Ok(exam)
    }

    pub async fn delete_exam(&self, id: &str) -> Result<bool> {
        let removed = db::exams::delete(&self.db, id).await?;
        if removed {
            self.deleted(Collection::Exams, id);
        }
        Ok(removed)
    }

    async fn class_student_ids(&self, school_id: &str, class_name: &str) -> Result<Vec<String>> {
        Ok(self
            .get_students_by_class(school_id, class_name)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect())
    }
}
