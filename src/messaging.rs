//! Parent notification composition.
//!
//! Builds message bodies from templates with `{name}`, `{date}` and
//! `{class}` placeholders. Students without a parent phone are skipped.

use crate::entities::sea_orm_active_enums::{AttendanceStatus, BehaviorStatus, MessageChannel};
use crate::entities::{attendance_records, students};
use crate::models::CreateMessage;
use chrono::NaiveDate;
use std::collections::HashMap;

pub const DEFAULT_ABSENCE_TEMPLATE: &str =
    "Dear parent, {name} ({class}) was absent from school on {date}. Please contact the school if this is unexpected.";

pub const DEFAULT_BEHAVIOR_TEMPLATE: &str =
    "Dear parent, a behavior note was recorded for {name} ({class}) on {date}. Please contact the class teacher.";

/// Fill a template for one student and date.
pub fn render(template: &str, student: &students::Model, date: NaiveDate) -> String {
    template
        .replace("{name}", &student.name)
        .replace("{class}", &student.class_name)
        .replace("{date}", &date.format("%Y-%m-%d").to_string())
}

/// Who sends the notices and how.
#[derive(Debug, Clone)]
pub struct NoticeOptions<'a> {
    pub school_id: &'a str,
    pub sender_id: Option<&'a str>,
    pub channel: MessageChannel,
    pub template: &'a str,
}

/// One message per record matching `wanted`, in roster order.
fn compose<F>(
    roster: &[students::Model],
    records: &[attendance_records::Model],
    date: NaiveDate,
    options: &NoticeOptions<'_>,
    wanted: F,
) -> Vec<CreateMessage>
where
    F: Fn(&attendance_records::Model) -> bool,
{
    let flagged: HashMap<&str, &attendance_records::Model> = records
        .iter()
        .filter(|r| r.date == date && wanted(r))
        .map(|r| (r.student_id.as_str(), r))
        .collect();

    roster
        .iter()
        .filter(|s| flagged.contains_key(s.id.as_str()))
        .filter_map(|student| {
            let phone = student.parent_phone.as_deref().map(str::trim).filter(|p| !p.is_empty())?;
            Some(CreateMessage {
                school_id: options.school_id.to_string(),
                student_id: student.id.clone(),
                sender_id: options.sender_id.map(str::to_string),
                recipient_phone: phone.to_string(),
                body: render(options.template, student, date),
                channel: options.channel,
            })
        })
        .collect()
}

/// Absence notices for students marked ABSENT on `date`.
pub fn absence_notices(
    roster: &[students::Model],
    records: &[attendance_records::Model],
    date: NaiveDate,
    options: &NoticeOptions<'_>,
) -> Vec<CreateMessage> {
    compose(roster, records, date, options, |r| r.status == AttendanceStatus::Absent)
}

/// Notices for students with a NEGATIVE behavior note on `date`.
pub fn behavior_notices(
    roster: &[students::Model],
    records: &[attendance_records::Model],
    date: NaiveDate,
    options: &NoticeOptions<'_>,
) -> Vec<CreateMessage> {
    compose(roster, records, date, options, |r| {
        r.behavior_status == Some(BehaviorStatus::Negative)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    fn student(id: &str, phone: Option<&str>) -> students::Model {
        students::Model {
            id: id.to_string(),
            name: format!("Student {id}"),
            national_id: format!("N{id}"),
            class_name: "5A".to_string(),
            parent_phone: phone.map(str::to_string),
            school_id: "sch-1".to_string(),
            created_by_id: None,
            created_at: Utc::now(),
        }
    }

    fn record(student_id: &str, day: u32, status: AttendanceStatus, behavior: Option<BehaviorStatus>) -> attendance_records::Model {
        attendance_records::Model {
            id: format!("{student_id}-{day}"),
            school_id: "sch-1".to_string(),
            student_id: student_id.to_string(),
            date: date(day),
            status,
            behavior_status: behavior,
            excuse_note: None,
            created_by_id: None,
        }
    }

    fn options() -> NoticeOptions<'static> {
        NoticeOptions {
            school_id: "sch-1",
            sender_id: Some("t1"),
            channel: MessageChannel::Sms,
            template: DEFAULT_ABSENCE_TEMPLATE,
        }
    }

    #[test]
    fn test_render_placeholders() {
        let body = render("{name} / {class} / {date}", &student("1", None), date(5));
        assert_eq!(body, "Student 1 / 5A / 2025-10-05");
    }

    #[test]
    fn test_absence_notices() {
        let roster = vec![student("1", Some("0501")), student("2", Some("0502")), student("3", None)];
        let records = vec![
            record("1", 5, AttendanceStatus::Absent, None),
            record("2", 5, AttendanceStatus::Present, None),
            record("3", 5, AttendanceStatus::Absent, None),
            record("2", 6, AttendanceStatus::Absent, None),
        ];

        let notices = absence_notices(&roster, &records, date(5), &options());
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].student_id, "1");
        assert_eq!(notices[0].recipient_phone, "0501");
        assert!(notices[0].body.contains("2025-10-05"));
        assert_eq!(notices[0].sender_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_behavior_notices() {
        let roster = vec![student("1", Some("0501")), student("2", Some("0502"))];
        let records = vec![
            record("1", 5, AttendanceStatus::Present, Some(BehaviorStatus::Negative)),
            record("2", 5, AttendanceStatus::Present, Some(BehaviorStatus::Positive)),
        ];
        let mut opts = options();
        opts.template = DEFAULT_BEHAVIOR_TEMPLATE;

        let notices = behavior_notices(&roster, &records, date(5), &opts);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].body.contains("behavior note"));
    }
}
