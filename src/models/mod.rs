//! DTOs for create and update operations, with their validation rules.

pub mod attendance;
pub mod exam;
pub mod message;
pub mod performance;
pub mod schedule;
pub mod student;
pub mod term;
pub mod user;

pub use attendance::SaveAttendance;
pub use exam::CreateExam;
pub use message::CreateMessage;
pub use performance::{CreatePerformance, UpdatePerformance};
pub use schedule::CreateScheduleEntry;
pub use student::{CreateStudent, UpdateStudent};
pub use term::{CreateTerm, UpdateTerm};
pub use user::{CreateSchool, CreateUser, UpdateUser};

/// Generate a new record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Trim a required text field, rejecting blanks.
pub(crate) fn required(field: &str, value: &str) -> crate::Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::AppError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, mapping blanks to None.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
