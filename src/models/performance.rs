//! Performance (grade) DTOs.

use crate::entities::sea_orm_active_enums::PerformanceCategory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// DTO for recording a score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePerformance {
    pub school_id: String,
    pub student_id: String,
    pub subject: String,
    pub title: Option<String>,
    pub score: f64,
    pub max_score: f64,
    pub category: PerformanceCategory,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_by_id: Option<String>,
}

/// DTO for correcting a score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePerformance {
    pub subject: Option<String>,
    pub title: Option<Option<String>>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub category: Option<PerformanceCategory>,
    pub date: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
}

/// Check a score against its maximum.
pub fn validate_score(score: f64, max_score: f64) -> crate::Result<()> {
    if !max_score.is_finite() || max_score <= 0.0 {
        return Err(crate::AppError::validation("Max score must be greater than 0"));
    }
    if !score.is_finite() || score < 0.0 || score > max_score {
        return Err(crate::AppError::validation(format!(
            "Score must be between 0 and {max_score}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_score_bounds() {
        assert!(validate_score(0.0, 10.0).is_ok());
        assert!(validate_score(10.0, 10.0).is_ok());
        assert!(validate_score(10.5, 10.0).is_err());
        assert!(validate_score(-1.0, 10.0).is_err());
        assert!(validate_score(1.0, 0.0).is_err());
        assert!(validate_score(f64::NAN, 10.0).is_err());
    }
}
