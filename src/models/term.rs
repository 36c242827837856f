//! Academic term DTOs.

use crate::entities::terms::Period;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// DTO for creating a term.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTerm {
    pub school_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub periods: Vec<Period>,
    #[serde(default)]
    pub is_current: bool,
}

/// DTO for updating a term.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTerm {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub periods: Option<Vec<Period>>,
    pub is_current: Option<bool>,
}

/// Check that a term's dates are ordered and its periods fall inside it.
pub fn validate_term_dates(start: NaiveDate, end: NaiveDate, periods: &[Period]) -> crate::Result<()> {
    if start > end {
        return Err(crate::AppError::validation("Term start must not be after its end"));
    }
    for period in periods {
        if period.start_date > period.end_date {
            return Err(crate::AppError::validation(format!(
                "Period '{}' starts after it ends",
                period.name
            )));
        }
        if period.start_date < start || period.end_date > end {
            return Err(crate::AppError::validation(format!(
                "Period '{}' lies outside the term",
                period.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn period(name: &str, start: NaiveDate, end: NaiveDate) -> Period {
        Period {
            name: name.to_string(),
            start_date: start,
            end_date: end,
        }
    }

    #[test]
    fn test_valid_term() {
        let periods = vec![period("P1", date(9, 1), date(10, 15)), period("P2", date(10, 16), date(11, 30))];
        assert!(validate_term_dates(date(9, 1), date(11, 30), &periods).is_ok());
    }

    #[test]
    fn test_reversed_term() {
        assert!(validate_term_dates(date(11, 30), date(9, 1), &[]).is_err());
    }

    #[test]
    fn test_period_outside_term() {
        let periods = vec![period("P1", date(8, 20), date(9, 10))];
        assert!(validate_term_dates(date(9, 1), date(11, 30), &periods).is_err());
    }
}
