//! Timetable DTOs.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// DTO for adding a timetable slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleEntry {
    pub school_id: String,
    pub teacher_id: String,
    pub class_name: String,
    pub subject: String,
    pub day_of_week: i32,
    pub period: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl CreateScheduleEntry {
    pub fn validate(&self) -> crate::Result<()> {
        super::required("Class", &self.class_name)?;
        super::required("Subject", &self.subject)?;
        if !(0..=6).contains(&self.day_of_week) {
            return Err(crate::AppError::validation("Day of week must be 0-6"));
        }
        if self.period < 1 {
            return Err(crate::AppError::validation("Period must be at least 1"));
        }
        if self.start_time >= self.end_time {
            return Err(crate::AppError::validation("Slot must end after it starts"));
        }
        Ok(())
    }
}
