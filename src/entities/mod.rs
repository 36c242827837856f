//! SeaORM entities for the local store.
//!
//! Every table mirrors one collection of the remote backend; models
//! serialize to the backend's camelCase wire shape.

pub mod prelude;

pub mod attendance_records;
pub mod exams;
pub mod messages;
pub mod performance_records;
pub mod schedule_entries;
pub mod schools;
pub mod sea_orm_active_enums;
pub mod students;
pub mod terms;
pub mod users;
