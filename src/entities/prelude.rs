pub use super::attendance_records::Entity as AttendanceRecords;
pub use super::exams::Entity as Exams;
pub use super::messages::Entity as Messages;
pub use super::performance_records::Entity as PerformanceRecords;
pub use super::schedule_entries::Entity as ScheduleEntries;
pub use super::schools::Entity as Schools;
pub use super::students::Entity as Students;
pub use super::terms::Entity as Terms;
pub use super::users::Entity as Users;
