//! Attendance DTOs.

use crate::entities::sea_orm_active_enums::{AttendanceStatus, BehaviorStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entry of an attendance sheet; saving replaces any existing record
/// for the same student and date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAttendance {
    pub student_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub behavior_status: Option<BehaviorStatus>,
    pub excuse_note: Option<String>,
}

impl SaveAttendance {
    pub fn new(student_id: impl Into<String>, date: NaiveDate, status: AttendanceStatus) -> Self {
        Self {
            student_id: student_id.into(),
            date,
            status,
            behavior_status: None,
            excuse_note: None,
        }
    }

    pub fn with_behavior(mut self, behavior: BehaviorStatus) -> Self {
        self.behavior_status = Some(behavior);
        self
    }

    pub fn with_excuse(mut self, note: impl Into<String>) -> Self {
        self.excuse_note = Some(note.into());
        self
    }
}
