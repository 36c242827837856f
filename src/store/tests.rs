//! Unit tests for the storage service.

use super::StorageService;
use crate::entities::sea_orm_active_enums::{
    AttendanceStatus, BehaviorStatus, MessageChannel, MessageStatus, PerformanceCategory, Role,
};
use crate::entities::terms::Period;
use crate::error::AppError;
use crate::events::{ChangeKind, ChangeOrigin, Collection, DataChange};
use crate::models::{
    CreateExam, CreateMessage, CreatePerformance, CreateScheduleEntry, CreateStudent, CreateTerm, CreateUser,
    SaveAttendance, UpdatePerformance, UpdateStudent, UpdateTerm, UpdateUser,
};
use crate::stats::DateRange;
use chrono::{NaiveDate, NaiveTime};
use tokio::sync::broadcast;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_student(name: &str, national_id: &str, class_name: &str) -> CreateStudent {
    CreateStudent {
        name: name.to_string(),
        national_id: national_id.to_string(),
        class_name: class_name.to_string(),
        parent_phone: Some("0500000001".to_string()),
        school_id: "sch-1".to_string(),
        created_by_id: None,
    }
}

fn homework(student_id: &str, score: f64) -> CreatePerformance {
    CreatePerformance {
        school_id: "sch-1".to_string(),
        student_id: student_id.to_string(),
        subject: "Math".to_string(),
        title: None,
        score,
        max_score: 10.0,
        category: PerformanceCategory::Homework,
        date: date(2025, 9, 10),
        notes: None,
        created_by_id: None,
    }
}

fn slot(teacher_id: &str, class_name: &str, period: i32) -> CreateScheduleEntry {
    CreateScheduleEntry {
        school_id: "sch-1".to_string(),
        teacher_id: teacher_id.to_string(),
        class_name: class_name.to_string(),
        subject: "Science".to_string(),
        day_of_week: 1,
        period,
        start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(8, 45, 0).unwrap(),
    }
}

fn term(name: &str, is_current: bool) -> CreateTerm {
    CreateTerm {
        school_id: "sch-1".to_string(),
        name: name.to_string(),
        start_date: date(2025, 9, 1),
        end_date: date(2025, 12, 20),
        periods: vec![Period {
            name: "P1".to_string(),
            start_date: date(2025, 9, 1),
            end_date: date(2025, 10, 30),
        }],
        is_current,
    }
}

fn drain(rx: &mut broadcast::Receiver<DataChange>) -> Vec<DataChange> {
    let mut out = Vec::new();
    while let Ok(change) = rx.try_recv() {
        out.push(change);
    }
    out
}

#[tokio::test]
async fn test_add_student_publishes_change() {
    let store = StorageService::open_in_memory().await.unwrap();
    let mut rx = store.subscribe_to_data_changes();

    let student = store.add_student(new_student("  Amal ", "1001", "5A")).await.unwrap();
    assert_eq!(student.name, "Amal");

    let changes = drain(&mut rx);
    assert_eq!(changes, vec![DataChange::upserted(Collection::Students, student.id.clone())]);
    assert_eq!(changes[0].origin, ChangeOrigin::Local);
}

#[tokio::test]
async fn test_add_student_rejects_blank_and_duplicate() {
    let store = StorageService::open_in_memory().await.unwrap();

    let blank = store.add_student(new_student("  ", "1001", "5A")).await;
    assert!(matches!(blank, Err(AppError::Validation(_))));

    store.add_student(new_student("Amal", "1001", "5A")).await.unwrap();
    let duplicate = store.add_student(new_student("Badr", "1001", "5B")).await;
    assert!(matches!(duplicate, Err(AppError::Validation(_))));
    assert_eq!(store.get_students("sch-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_student() {
    let store = StorageService::open_in_memory().await.unwrap();
    let amal = store.add_student(new_student("Amal", "1001", "5A")).await.unwrap();
    store.add_student(new_student("Badr", "1002", "5A")).await.unwrap();

    let updated = store
        .update_student(
            &amal.id,
            UpdateStudent {
                class_name: Some("6A".to_string()),
                parent_phone: Some(Some("   ".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.class_name, "6A");
    assert_eq!(updated.parent_phone, None);

    let clash = store
        .update_student(
            &amal.id,
            UpdateStudent {
                national_id: Some("1002".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(clash, Err(AppError::Validation(_))));

    let missing = store.update_student("nope", UpdateStudent::default()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_class_queries_and_search() {
    let store = StorageService::open_in_memory().await.unwrap();
    store.add_student(new_student("Amal", "1001", "5A")).await.unwrap();
    store.add_student(new_student("Badr", "1002", "5B")).await.unwrap();
    store.add_student(new_student("Dana", "2003", "5A")).await.unwrap();

    assert_eq!(store.class_names("sch-1").await.unwrap(), vec!["5A", "5B"]);
    assert_eq!(store.get_students_by_class("sch-1", "5A").await.unwrap().len(), 2);
    assert_eq!(store.search_students("sch-1", "bad").await.unwrap().len(), 1);
    assert_eq!(store.search_students("sch-1", "200").await.unwrap().len(), 1);
    assert_eq!(store.search_students("sch-1", "  ").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_save_attendance_upserts_per_day() {
    let store = StorageService::open_in_memory().await.unwrap();
    let amal = store.add_student(new_student("Amal", "1001", "5A")).await.unwrap();
    let day = date(2025, 9, 14);

    let first = store
        .save_attendance("sch-1", Some("t1"), &[SaveAttendance::new(&amal.id, day, AttendanceStatus::Absent)])
        .await
        .unwrap();
    let second = store
        .save_attendance(
            "sch-1",
            Some("t1"),
            &[SaveAttendance::new(&amal.id, day, AttendanceStatus::Late).with_behavior(BehaviorStatus::Positive)],
        )
        .await
        .unwrap();
    assert_eq!(first[0].id, second[0].id);

    let records = store.get_attendance_for_class("sch-1", "5A", day).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, AttendanceStatus::Late);
    assert_eq!(records[0].behavior_status, Some(BehaviorStatus::Positive));
}

#[tokio::test]
async fn test_save_attendance_unknown_student_writes_nothing() {
    let store = StorageService::open_in_memory().await.unwrap();
    let amal = store.add_student(new_student("Amal", "1001", "5A")).await.unwrap();
    let day = date(2025, 9, 14);

    let result = store
        .save_attendance(
            "sch-1",
            None,
            &[
                SaveAttendance::new(&amal.id, day, AttendanceStatus::Present),
                SaveAttendance::new("ghost", day, AttendanceStatus::Present),
            ],
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(store.get_attendance("sch-1", DateRange::unbounded()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_attendance_range_filter() {
    let store = StorageService::open_in_memory().await.unwrap();
    let amal = store.add_student(new_student("Amal", "1001", "5A")).await.unwrap();
    let entries: Vec<SaveAttendance> = (1..=5)
        .map(|d| SaveAttendance::new(&amal.id, date(2025, 9, d), AttendanceStatus::Present))
        .collect();
    store.save_attendance("sch-1", None, &entries).await.unwrap();

    let range = DateRange::new(date(2025, 9, 2), date(2025, 9, 4));
    assert_eq!(store.get_student_attendance(&amal.id, range).await.unwrap().len(), 3);
    assert_eq!(store.get_class_attendance("sch-1", "5A", range).await.unwrap().len(), 3);
    assert_eq!(store.get_attendance("sch-1", DateRange::unbounded()).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_delete_student_cascades() {
    let store = StorageService::open_in_memory().await.unwrap();
    let amal = store.add_student(new_student("Amal", "1001", "5A")).await.unwrap();
    let att = store
        .save_attendance(
            "sch-1",
            None,
            &[SaveAttendance::new(&amal.id, date(2025, 9, 14), AttendanceStatus::Present)],
        )
        .await
        .unwrap();
    let perf = store.add_performance(homework(&amal.id, 8.0)).await.unwrap();

    let mut rx = store.subscribe_to_data_changes();
    assert!(store.delete_student(&amal.id).await.unwrap());

    let changes = drain(&mut rx);
    assert!(changes.contains(&DataChange::deleted(Collection::Attendance, att[0].id.clone())));
    assert!(changes.contains(&DataChange::deleted(Collection::Performance, perf.id.clone())));
    assert!(changes.contains(&DataChange::deleted(Collection::Students, amal.id.clone())));

    let counts = store.table_counts().await.unwrap();
    assert_eq!(counts.students, 0);
    assert_eq!(counts.attendance_records, 0);
    assert_eq!(counts.performance_records, 0);

    assert!(!store.delete_student(&amal.id).await.unwrap());
}

#[tokio::test]
async fn test_performance_validation() {
    let store = StorageService::open_in_memory().await.unwrap();
    let amal = store.add_student(new_student("Amal", "1001", "5A")).await.unwrap();

    let over = store.add_performance(homework(&amal.id, 12.0)).await;
    assert!(matches!(over, Err(AppError::Validation(_))));

    let orphan = store.add_performance(homework("ghost", 5.0)).await;
    assert!(matches!(orphan, Err(AppError::NotFound(_))));

    let record = store.add_performance(homework(&amal.id, 6.0)).await.unwrap();
    let shrink = store
        .update_performance(
            &record.id,
            UpdatePerformance {
                max_score: Some(5.0),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(shrink, Err(AppError::Validation(_))));

    let updated = store
        .update_performance(
            &record.id,
            UpdatePerformance {
                score: Some(9.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.score, 9.0);

    let class = store
        .get_class_performance("sch-1", "5A", DateRange::unbounded())
        .await
        .unwrap();
    assert_eq!(class.len(), 1);
}

#[tokio::test]
async fn test_single_current_term() {
    let store = StorageService::open_in_memory().await.unwrap();
    let first = store.add_term(term("Term 1", true)).await.unwrap();

    let mut rx = store.subscribe_to_data_changes();
    let second = store.add_term(term("Term 2", true)).await.unwrap();

    let changes = drain(&mut rx);
    assert!(changes.contains(&DataChange::upserted(Collection::Terms, first.id.clone())));

    let current = store.current_term("sch-1", date(2026, 1, 1)).await.unwrap().unwrap();
    assert_eq!(current.id, second.id);
    assert!(!store.get_term(&first.id).await.unwrap().unwrap().is_current);

    store
        .update_term(
            &first.id,
            UpdateTerm {
                is_current: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!store.get_term(&second.id).await.unwrap().unwrap().is_current);
}

#[tokio::test]
async fn test_term_dates_validated() {
    let store = StorageService::open_in_memory().await.unwrap();
    let mut bad = term("Backwards", false);
    bad.end_date = date(2025, 8, 1);
    assert!(matches!(store.add_term(bad).await, Err(AppError::Validation(_))));

    let ok = store.add_term(term("Term 1", false)).await.unwrap();
    let bad_update = store
        .update_term(
            &ok.id,
            UpdateTerm {
                start_date: Some(date(2026, 1, 1)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(bad_update, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_schedule_conflicts() {
    let store = StorageService::open_in_memory().await.unwrap();
    store.add_schedule_entry(slot("t1", "5A", 1)).await.unwrap();

    let teacher_clash = store.add_schedule_entry(slot("t1", "5B", 1)).await;
    assert!(matches!(teacher_clash, Err(AppError::Validation(_))));

    let class_clash = store.add_schedule_entry(slot("t2", "5A", 1)).await;
    assert!(matches!(class_clash, Err(AppError::Validation(_))));

    store.add_schedule_entry(slot("t2", "5B", 1)).await.unwrap();
    store.add_schedule_entry(slot("t1", "5A", 2)).await.unwrap();

    assert_eq!(store.get_schedule_for_teacher("t1").await.unwrap().len(), 2);
    assert_eq!(store.get_schedule_for_class("sch-1", "5B").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_message_lifecycle() {
    let store = StorageService::open_in_memory().await.unwrap();
    let message = store
        .queue_message(CreateMessage {
            school_id: "sch-1".to_string(),
            student_id: "s1".to_string(),
            sender_id: None,
            recipient_phone: "0500000001".to_string(),
            body: "Absent today".to_string(),
            channel: MessageChannel::Sms,
        })
        .await
        .unwrap();
    assert_eq!(message.status, MessageStatus::Pending);
    assert_eq!(store.pending_messages("sch-1").await.unwrap().len(), 1);

    let sent = store.mark_message(&message.id, MessageStatus::Sent).await.unwrap();
    assert!(sent.sent_at.is_some());
    assert!(store.pending_messages("sch-1").await.unwrap().is_empty());
    assert_eq!(store.get_messages("sch-1", Some("s1")).await.unwrap().len(), 1);

    let missing = store.mark_message("nope", MessageStatus::Failed).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_upcoming_exams() {
    let store = StorageService::open_in_memory().await.unwrap();
    for (title, day) in [("Quiz", 5), ("Midterm", 20)] {
        store
            .add_exam(CreateExam {
                school_id: "sch-1".to_string(),
                term_id: None,
                class_name: "5A".to_string(),
                subject: "Math".to_string(),
                title: title.to_string(),
                date: date(2025, 10, day),
                max_score: 20.0,
                duration_minutes: Some(45),
            })
            .await
            .unwrap();
    }

    let upcoming = store.upcoming_exams("sch-1", "5A", date(2025, 10, 10)).await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].title, "Midterm");
    assert_eq!(store.get_exams("sch-1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_user_login_lookup() {
    let store = StorageService::open_in_memory().await.unwrap();
    let parent = store
        .add_user(CreateUser {
            school_id: Some("sch-1".to_string()),
            name: "Huda".to_string(),
            role: Role::Parent,
            phone: Some("0500000001".to_string()),
            national_id: None,
            assigned_classes: Vec::new(),
        })
        .await
        .unwrap();

    let found = store.find_user_by_login(" 0500000001 ").await.unwrap().unwrap();
    assert_eq!(found.id, parent.id);
    assert!(store.find_user_by_login("").await.unwrap().is_none());

    let mut rx = store.subscribe_to_data_changes();
    assert!(store.delete_user(&parent.id).await.unwrap());
    assert_eq!(drain(&mut rx)[0].kind, ChangeKind::Deleted(parent.id.clone()));
}

#[tokio::test]
async fn test_performance_student_must_match_school() {
    let store = StorageService::open_in_memory().await.unwrap();
    let amal = store.add_student(new_student("Amal", "1001", "5A")).await.unwrap();

    let mut elsewhere = homework(&amal.id, 5.0);
    elsewhere.school_id = "sch-2".to_string();
    assert!(matches!(store.add_performance(elsewhere).await, Err(AppError::Validation(_))));

    let mut padded = homework(&amal.id, 5.0);
    padded.school_id = " sch-1 ".to_string();
    let record = store.add_performance(padded).await.unwrap();
    assert_eq!(record.school_id, "sch-1");
}

#[tokio::test]
async fn test_schedule_conflicts_ignore_padding() {
    let store = StorageService::open_in_memory().await.unwrap();
    store.add_schedule_entry(slot("t1", "5A", 1)).await.unwrap();

    let class_clash = store.add_schedule_entry(slot("t2", "5A ", 1)).await;
    assert!(matches!(class_clash, Err(AppError::Validation(_))));

    let teacher_clash = store.add_schedule_entry(slot(" t1", "5B", 1)).await;
    assert!(matches!(teacher_clash, Err(AppError::Validation(_))));

    let entry = store.add_schedule_entry(slot("t2", " 5B ", 2)).await.unwrap();
    assert_eq!(entry.class_name, "5B");
    assert_eq!(store.get_schedule_for_class("sch-1", "5B").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_exam_fields_trimmed() {
    let store = StorageService::open_in_memory().await.unwrap();
    store
        .add_exam(CreateExam {
            school_id: "sch-1".to_string(),
            term_id: Some("  ".to_string()),
            class_name: " 5A".to_string(),
            subject: "Math ".to_string(),
            title: " Final ".to_string(),
            date: date(2025, 12, 1),
            max_score: 50.0,
            duration_minutes: None,
        })
        .await
        .unwrap();

    let upcoming = store.upcoming_exams("sch-1", "5A", date(2025, 11, 1)).await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].title, "Final");
    assert_eq!(upcoming[0].subject, "Math");
    assert!(upcoming[0].term_id.is_none());
}

#[tokio::test]
async fn test_update_user_keeps_account_valid() {
    let store = StorageService::open_in_memory().await.unwrap();
    let parent = store
        .add_user(CreateUser {
            school_id: Some("sch-1".to_string()),
            name: "Huda".to_string(),
            role: Role::Parent,
            phone: Some("0500000001".to_string()),
            national_id: Some("2002".to_string()),
            assigned_classes: Vec::new(),
        })
        .await
        .unwrap();

    let blanked = store
        .update_user(
            &parent.id,
            UpdateUser {
                phone: Some(Some("   ".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(blanked.phone.is_none());
    assert_eq!(blanked.national_id.as_deref(), Some("2002"));

    let no_login = store
        .update_user(
            &parent.id,
            UpdateUser {
                national_id: Some(None),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(no_login, Err(AppError::Validation(_))));
    let stored = store.get_user(&parent.id).await.unwrap().unwrap();
    assert_eq!(stored.national_id.as_deref(), Some("2002"));

    let staff = store
        .add_user(CreateUser {
            school_id: Some("sch-1".to_string()),
            name: "Nour".to_string(),
            role: Role::Teacher,
            phone: None,
            national_id: None,
            assigned_classes: vec!["5A".to_string()],
        })
        .await
        .unwrap();
    let to_student = store
        .update_user(
            &staff.id,
            UpdateUser {
                role: Some(Role::Student),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(to_student, Err(AppError::Validation(_))));

    let missing = store.update_user("nope", UpdateUser::default()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_login_lookup_any_phone_notation() {
    let store = StorageService::open_in_memory().await.unwrap();
    let parent = store
        .add_user(CreateUser {
            school_id: Some("sch-1".to_string()),
            name: "Huda".to_string(),
            role: Role::Parent,
            phone: Some("+966 500 000 001".to_string()),
            national_id: None,
            assigned_classes: Vec::new(),
        })
        .await
        .unwrap();

    for login in ["+966 500 000 001", "00966500000001", "966-500-000-001"] {
        let found = store.find_user_by_login(login).await.unwrap().unwrap();
        assert_eq!(found.id, parent.id);
    }
    assert!(store.find_user_by_login("0599999999").await.unwrap().is_none());
    assert!(store.find_user_by_login("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_export_json_covers_every_collection() {
    let store = StorageService::open_in_memory().await.unwrap();
    let amal = store.add_student(new_student("Amal", "1001", "5A")).await.unwrap();
    store.add_performance(homework(&amal.id, 7.0)).await.unwrap();

    let export = store.export_json().await.unwrap();
    assert_eq!(export.len(), Collection::ALL.len());
    assert_eq!(export["students"][0]["nationalId"], "1001");
    assert_eq!(export["performance"][0]["studentId"], amal.id.as_str());
    assert_eq!(export["exams"].as_array().unwrap().len(), 0);
}
