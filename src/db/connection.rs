//! Database connection pool, schema and utility functions.

use crate::entities::{attendance_records, prelude::*};
use sea_orm::sea_query::Index;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Schema,
};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Create a new database connection with configured pool settings and
/// make sure every table exists.
///
/// An in-memory SQLite database lives inside a single connection, so the
/// pool is pinned to one long-lived connection in that case.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let in_memory = database_url.contains(":memory:");

    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(if in_memory { 1 } else { max_connections })
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);
    if in_memory {
        opt.idle_timeout(Duration::from_secs(u32::MAX as u64))
            .max_lifetime(Duration::from_secs(u32::MAX as u64));
    } else {
        opt.idle_timeout(Duration::from_secs(300));
    }

    let db = Database::connect(opt).await?;
    create_schema(&db).await?;
    Ok(db)
}

/// Create missing tables and indexes from the entity definitions.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, Schools).await?;
    create_table(db, Users).await?;
    create_table(db, Students).await?;
    create_table(db, AttendanceRecords).await?;
    create_table(db, PerformanceRecords).await?;
    create_table(db, Terms).await?;
    create_table(db, Messages).await?;
    create_table(db, ScheduleEntries).await?;
    create_table(db, Exams).await?;

    let backend = db.get_database_backend();
    let mut index = Index::create();
    index
        .name("idx_attendance_student_date")
        .table(AttendanceRecords)
        .col(attendance_records::Column::StudentId)
        .col(attendance_records::Column::Date)
        .unique()
        .if_not_exists();
    db.execute(backend.build(&index)).await?;

    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    db.execute(backend.build(stmt.if_not_exists())).await?;
    Ok(())
}

/// Test database connection by executing a simple query.
pub async fn test_connection(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute_unprepared("SELECT 1").await?;
    Ok(())
}

/// Get record counts for the main tables.
pub async fn get_table_counts(db: &DatabaseConnection) -> Result<TableCounts, DbErr> {
    let students = Students::find().count(db).await?;
    let users = Users::find().count(db).await?;
    let attendance_records = AttendanceRecords::find().count(db).await?;
    let performance_records = PerformanceRecords::find().count(db).await?;
    let messages = Messages::find().count(db).await?;

    Ok(TableCounts {
        students,
        users,
        attendance_records,
        performance_records,
        messages,
    })
}

/// Table record counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCounts {
    pub students: u64,
    pub users: u64,
    pub attendance_records: u64,
    pub performance_records: u64,
    pub messages: u64,
}
