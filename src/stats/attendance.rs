//! Attendance and behavior counts.

use crate::entities::attendance_records;
use crate::entities::sea_orm_active_enums::{AttendanceStatus, BehaviorStatus};
use serde::Serialize;

/// Status counts over a set of attendance records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub excused: usize,
}

impl AttendanceSummary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a attendance_records::Model>,
    {
        let mut summary = Self::default();
        for record in records {
            summary.add(record.status);
        }
        summary
    }

    pub fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::Excused => self.excused += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.present + self.absent + self.late + self.excused
    }

    /// Percentage of days attended (present or late); 0 with no records.
    pub fn rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.present + self.late) as f64 / total as f64 * 100.0
    }

    /// Attendance credit in [0, 1]: present and excused days count fully,
    /// late days count `late_credit`, absences nothing.
    pub fn credit_ratio(&self, late_credit: f64) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let credit = (self.present + self.excused) as f64 + self.late as f64 * late_credit;
        credit / total as f64
    }
}

/// Behavior tag counts; records without a tag are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BehaviorTally {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl BehaviorTally {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a attendance_records::Model>,
    {
        let mut tally = Self::default();
        for behavior in records.into_iter().filter_map(|r| r.behavior_status) {
            match behavior {
                BehaviorStatus::Positive => tally.positive += 1,
                BehaviorStatus::Negative => tally.negative += 1,
                BehaviorStatus::Neutral => tally.neutral += 1,
            }
        }
        tally
    }

    /// Positive minus negative notes.
    pub fn net(&self) -> i64 {
        self.positive as i64 - self.negative as i64
    }
}
