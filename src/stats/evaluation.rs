//! Weighted evaluation composite.
//!
//! Four ratios in [0, 1] (homework completion, activity points against a
//! target, attendance credit and exam score) are each multiplied by their
//! weight; with the default weights {10, 15, 15, 20} the composite is out of 60.

use crate::config::GradingConfig;
use crate::entities::sea_orm_active_enums::PerformanceCategory;
use crate::entities::{attendance_records, performance_records};
use serde::Serialize;
use std::collections::BTreeMap;

use super::AttendanceSummary;

/// Component ratios before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EvaluationRatios {
    pub homework: f64,
    pub activity: f64,
    pub attendance: f64,
    pub exam: f64,
}

/// Weighted components and their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub homework: f64,
    pub activity: f64,
    pub attendance: f64,
    pub exam: f64,
    pub total: f64,
    /// Sum of the weights, i.e. the best possible total.
    pub max_total: f64,
}

impl Evaluation {
    pub fn percent(&self) -> f64 {
        if self.max_total <= 0.0 {
            return 0.0;
        }
        self.total / self.max_total * 100.0
    }
}

/// Mean score of one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAverage {
    pub subject: String,
    pub percent: f64,
    pub records: usize,
}

fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) }
}

/// Weighted sum of the ratios, each component capped at its weight.
pub fn composite(ratios: &EvaluationRatios, grading: &GradingConfig) -> Evaluation {
    let homework = clamp_ratio(ratios.homework) * grading.homework_weight;
    let activity = clamp_ratio(ratios.activity) * grading.activity_weight;
    let attendance = clamp_ratio(ratios.attendance) * grading.attendance_weight;
    let exam = clamp_ratio(ratios.exam) * grading.exam_weight;

    Evaluation {
        homework,
        activity,
        attendance,
        exam,
        total: homework + activity + attendance + exam,
        max_total: grading.total_weight(),
    }
}

/// Derive the component ratios from a student's records.
///
/// A homework item counts as completed when it has a positive score.
/// Components without records contribute a ratio of 0.
pub fn evaluation_ratios(
    performance: &[performance_records::Model],
    attendance: &[attendance_records::Model],
    grading: &GradingConfig,
) -> EvaluationRatios {
    let homework: Vec<_> = performance
        .iter()
        .filter(|r| r.category == PerformanceCategory::Homework)
        .collect();
    let homework_ratio = if homework.is_empty() {
        0.0
    } else {
        homework.iter().filter(|r| r.score > 0.0).count() as f64 / homework.len() as f64
    };

    let activity_points: f64 = performance
        .iter()
        .filter(|r| r.category == PerformanceCategory::Activity)
        .map(|r| r.score)
        .sum();
    let activity_ratio = if grading.activity_target > 0.0 {
        activity_points / grading.activity_target
    } else {
        0.0
    };

    let (exam_score, exam_max) = performance
        .iter()
        .filter(|r| r.category == PerformanceCategory::PlatformExam)
        .fold((0.0, 0.0), |(score, max), r| (score + r.score, max + r.max_score));
    let exam_ratio = if exam_max > 0.0 { exam_score / exam_max } else { 0.0 };

    let attendance_ratio = AttendanceSummary::from_records(attendance).credit_ratio(grading.late_credit);

    EvaluationRatios {
        homework: homework_ratio,
        activity: activity_ratio,
        attendance: attendance_ratio,
        exam: exam_ratio,
    }
}

/// Evaluate one student from their performance and attendance records.
pub fn evaluate_student(
    performance: &[performance_records::Model],
    attendance: &[attendance_records::Model],
    grading: &GradingConfig,
) -> Evaluation {
    composite(&evaluation_ratios(performance, attendance, grading), grading)
}

/// Percent average per subject, sorted by subject name.
pub fn subject_averages(performance: &[performance_records::Model]) -> Vec<SubjectAverage> {
    let mut by_subject: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
    for record in performance {
        let entry = by_subject.entry(record.subject.as_str()).or_default();
        entry.0 += record.score;
        entry.1 += record.max_score;
        entry.2 += 1;
    }

    by_subject
        .into_iter()
        .map(|(subject, (score, max, records))| SubjectAverage {
            subject: subject.to_string(),
            percent: if max > 0.0 { score / max * 100.0 } else { 0.0 },
            records,
        })
        .collect()
}
