//! Statistics derived from loaded records: attendance rates, behavior
//! tallies, the weighted evaluation composite and class reports.

pub mod attendance;
pub mod evaluation;
pub mod report;

pub use attendance::{AttendanceSummary, BehaviorTally};
pub use evaluation::{Evaluation, EvaluationRatios, composite, evaluate_student, subject_averages};
pub use report::{StudentReportRow, class_report};

use crate::entities::terms;
use chrono::NaiveDate;

// Bounds that still sort correctly as ISO text in SQLite.
const EARLIEST: NaiveDate = match NaiveDate::from_ymd_opt(1, 1, 1) {
    Some(d) => d,
    None => panic!("invalid earliest date"),
};
const LATEST: NaiveDate = match NaiveDate::from_ymd_opt(9999, 12, 31) {
    Some(d) => d,
    None => panic!("invalid latest date"),
};

/// Inclusive date range used to scope attendance and performance queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Every date the store can hold.
    pub fn unbounded() -> Self {
        Self {
            start: EARLIEST,
            end: LATEST,
        }
    }

    /// Range of a whole term.
    pub fn from_term(term: &terms::Model) -> Self {
        Self::new(term.start_date, term.end_date)
    }

    /// Range of a named period of the term, if it has one.
    pub fn from_period(term: &terms::Model, period_name: &str) -> Option<Self> {
        term.periods
            .0
            .iter()
            .find(|p| p.name == period_name)
            .map(|p| Self::new(p.start_date, p.end_date))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::terms::{Period, Periods};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn term() -> terms::Model {
        terms::Model {
            id: "t1".to_string(),
            school_id: "sch-1".to_string(),
            name: "First term".to_string(),
            start_date: date(9, 1),
            end_date: date(12, 20),
            periods: Periods(vec![Period {
                name: "P1".to_string(),
                start_date: date(9, 1),
                end_date: date(10, 31),
            }]),
            is_current: true,
        }
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = DateRange::from_term(&term());
        assert!(range.contains(date(9, 1)));
        assert!(range.contains(date(12, 20)));
        assert!(!range.contains(date(12, 21)));
    }

    #[test]
    fn test_period_range() {
        let range = DateRange::from_period(&term(), "P1").unwrap();
        assert_eq!(range.end, date(10, 31));
        assert!(DateRange::from_period(&term(), "P9").is_none());
    }

    #[test]
    fn test_unbounded_contains_everything() {
        assert!(DateRange::unbounded().contains(date(1, 1)));
    }
}
