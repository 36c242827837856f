//! Weekly timetable checks.

use crate::entities::schedule_entries;
use crate::models::CreateScheduleEntry;
use chrono::{Datelike, NaiveDate};

/// Why a candidate slot cannot be booked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// The teacher already teaches in that slot.
    Teacher { existing_id: String, class_name: String },
    /// The class already has a lesson in that slot.
    Class { existing_id: String, teacher_id: String },
}

impl Conflict {
    pub fn describe(&self) -> String {
        match self {
            Conflict::Teacher { class_name, .. } => {
                format!("Teacher is already booked with class {class_name} in this slot")
            }
            Conflict::Class { teacher_id, .. } => {
                format!("Class already has a lesson with teacher {teacher_id} in this slot")
            }
        }
    }
}

/// First clash between the candidate and existing slots of the same school.
pub fn find_conflict(existing: &[schedule_entries::Model], candidate: &CreateScheduleEntry) -> Option<Conflict> {
    existing
        .iter()
        .filter(|e| {
            e.school_id == candidate.school_id
                && e.day_of_week == candidate.day_of_week
                && e.period == candidate.period
        })
        .find_map(|e| {
            if e.teacher_id == candidate.teacher_id {
                Some(Conflict::Teacher {
                    existing_id: e.id.clone(),
                    class_name: e.class_name.clone(),
                })
            } else if e.class_name == candidate.class_name {
                Some(Conflict::Class {
                    existing_id: e.id.clone(),
                    teacher_id: e.teacher_id.clone(),
                })
            } else {
                None
            }
        })
}

/// Day-of-week index (0 = Sunday) for a calendar date.
pub fn weekday_index(date: NaiveDate) -> i32 {
    date.weekday().num_days_from_sunday() as i32
}

/// Slots of one weekday, ordered by period.
pub fn day_schedule(entries: &[schedule_entries::Model], day_of_week: i32) -> Vec<schedule_entries::Model> {
    let mut day: Vec<_> = entries
        .iter()
        .filter(|e| e.day_of_week == day_of_week)
        .cloned()
        .collect();
    day.sort_by_key(|e| e.period);
    day
}
