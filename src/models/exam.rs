//! Exam DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// DTO for scheduling an exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExam {
    pub school_id: String,
    pub term_id: Option<String>,
    pub class_name: String,
    pub subject: String,
    pub title: String,
    pub date: NaiveDate,
    pub max_score: f64,
    pub duration_minutes: Option<i32>,
}

impl CreateExam {
    pub fn validate(&self) -> crate::Result<()> {
        super::required("Class", &self.class_name)?;
        super::required("Subject", &self.subject)?;
        super::required("Title", &self.title)?;
        if !self.max_score.is_finite() || self.max_score <= 0.0 {
            return Err(crate::AppError::validation("Max score must be greater than 0"));
        }
        if self.duration_minutes.is_some_and(|m| m <= 0) {
            return Err(crate::AppError::validation("Duration must be positive"));
        }
        Ok(())
    }
}
