//! Per-class report rows.

use crate::config::GradingConfig;
use crate::entities::{attendance_records, performance_records, students};
use serde::Serialize;
use std::collections::HashMap;

use super::{AttendanceSummary, BehaviorTally, Evaluation, evaluate_student};

/// One student's line in a class report.
#[derive(Debug, Clone, Serialize)]
pub struct StudentReportRow {
    pub student_id: String,
    pub name: String,
    pub class_name: String,
    pub attendance: AttendanceSummary,
    pub behavior: BehaviorTally,
    pub evaluation: Evaluation,
    pub at_risk: bool,
}

/// Build report rows for the given students from already-loaded records.
///
/// Records of students not in `roster` are ignored. Rows are sorted by name.
pub fn class_report(
    roster: &[students::Model],
    performance: &[performance_records::Model],
    attendance: &[attendance_records::Model],
    grading: &GradingConfig,
) -> Vec<StudentReportRow> {
    let mut perf_by_student: HashMap<&str, Vec<performance_records::Model>> = HashMap::new();
    for record in performance {
        perf_by_student
            .entry(record.student_id.as_str())
            .or_default()
            .push(record.clone());
    }
    let mut attendance_by_student: HashMap<&str, Vec<attendance_records::Model>> = HashMap::new();
    for record in attendance {
        attendance_by_student
            .entry(record.student_id.as_str())
            .or_default()
            .push(record.clone());
    }

    let mut rows: Vec<StudentReportRow> = roster
        .iter()
        .map(|student| {
            let perf = perf_by_student.get(student.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
            let days = attendance_by_student
                .get(student.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let summary = AttendanceSummary::from_records(days);
            let evaluation = evaluate_student(perf, days, grading);
            let low_attendance = summary.total() > 0 && summary.rate() < grading.at_risk_attendance;
            let low_total = evaluation.total < grading.at_risk_total;

            StudentReportRow {
                student_id: student.id.clone(),
                name: student.name.clone(),
                class_name: student.class_name.clone(),
                attendance: summary,
                behavior: BehaviorTally::from_records(days),
                evaluation,
                at_risk: low_attendance || low_total,
            }
        })
        .collect();

    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sea_orm_active_enums::{AttendanceStatus, PerformanceCategory};
    use chrono::{NaiveDate, Utc};

    fn student(id: &str, name: &str) -> students::Model {
        students::Model {
            id: id.to_string(),
            name: name.to_string(),
            national_id: format!("N{id}"),
            class_name: "5A".to_string(),
            parent_phone: None,
            school_id: "sch-1".to_string(),
            created_by_id: None,
            created_at: Utc::now(),
        }
    }

    fn day(student_id: &str, d: u32, status: AttendanceStatus) -> attendance_records::Model {
        attendance_records::Model {
            id: format!("{student_id}-{d}"),
            school_id: "sch-1".to_string(),
            student_id: student_id.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 10, d).unwrap(),
            status,
            behavior_status: None,
            excuse_note: None,
            created_by_id: None,
        }
    }

    fn exam(student_id: &str, score: f64) -> performance_records::Model {
        performance_records::Model {
            id: format!("{student_id}-exam"),
            school_id: "sch-1".to_string(),
            student_id: student_id.to_string(),
            subject: "Math".to_string(),
            title: None,
            score,
            max_score: 20.0,
            category: PerformanceCategory::PlatformExam,
            date: NaiveDate::from_ymd_opt(2025, 10, 5).unwrap(),
            notes: None,
            created_by_id: None,
        }
    }

    #[test]
    fn test_rows_sorted_and_scoped() {
        let roster = vec![student("b", "Zaid"), student("a", "Huda")];
        let attendance = vec![
            day("a", 1, AttendanceStatus::Present),
            day("b", 1, AttendanceStatus::Absent),
            day("other", 1, AttendanceStatus::Present),
        ];
        let rows = class_report(&roster, &[], &attendance, &GradingConfig::default());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Huda");
        assert_eq!(rows[0].attendance.present, 1);
        assert_eq!(rows[1].attendance.absent, 1);
    }

    #[test]
    fn test_at_risk_flags() {
        let mut grading = GradingConfig::default();
        grading.at_risk_total = 20.0;

        let roster = vec![student("a", "Huda"), student("b", "Zaid")];
        let attendance = vec![
            day("a", 1, AttendanceStatus::Present),
            day("a", 2, AttendanceStatus::Present),
            day("b", 1, AttendanceStatus::Absent),
            day("b", 2, AttendanceStatus::Present),
        ];
        let performance = vec![exam("a", 20.0), exam("b", 20.0)];
        let rows = class_report(&roster, &performance, &attendance, &grading);

        // Huda: 15 attendance + 20 exam = 35; Zaid: 50% attendance.
        assert!(!rows[0].at_risk);
        assert!(rows[1].at_risk);
    }
}
