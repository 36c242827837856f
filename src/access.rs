//! Role-based scoping for the portals.
//!
//! A [`Viewer`] is the logged-in account. It answers two questions: may it
//! perform an [`Action`], and which students may it see.

use crate::entities::sea_orm_active_enums::Role;
use crate::entities::users::ClassList;
use crate::entities::{students, users};
use crate::error::{AppError, Result};

/// Mutating operations guarded by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ManageSchools,
    ManageStaff,
    ManageStudents,
    RecordAttendance,
    RecordGrades,
    SendMessages,
    ManageSchedule,
    ManageExams,
    ManageTerms,
    ViewReports,
}

#[derive(Debug, Clone)]
pub struct Viewer {
    pub user_id: String,
    pub role: Role,
    pub school_id: Option<String>,
    pub assigned_classes: ClassList,
    pub phone: Option<String>,
    pub national_id: Option<String>,
}

impl From<&users::Model> for Viewer {
    fn from(user: &users::Model) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
            school_id: user.school_id.clone(),
            assigned_classes: user.assigned_classes.clone(),
            phone: user.phone.clone(),
            national_id: user.national_id.clone(),
        }
    }
}

impl Viewer {
    /// Permission matrix.
    pub fn can(&self, action: Action) -> bool {
        match self.role {
            Role::Admin => true,
            Role::SchoolManager => action != Action::ManageSchools,
            Role::Teacher => matches!(
                action,
                Action::ManageStudents
                    | Action::RecordAttendance
                    | Action::RecordGrades
                    | Action::SendMessages
                    | Action::ManageExams
                    | Action::ViewReports
            ),
            Role::Parent | Role::Student => false,
        }
    }

    /// Fail with `Forbidden` unless the action is allowed.
    pub fn require(&self, action: Action) -> Result<()> {
        if self.can(action) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("{:?} may not {:?}", self.role, action)))
        }
    }

    fn same_school(&self, student: &students::Model) -> bool {
        self.school_id.as_deref() == Some(student.school_id.as_str())
    }

    pub fn can_view_student(&self, student: &students::Model) -> bool {
        match self.role {
            Role::Admin => true,
            Role::SchoolManager => self.same_school(student),
            Role::Teacher => {
                self.same_school(student)
                    && (self.assigned_classes.contains(&student.class_name)
                        || student.created_by_id.as_deref() == Some(self.user_id.as_str()))
            }
            Role::Parent => match (&self.phone, &student.parent_phone) {
                (Some(mine), Some(theirs)) => normalize_phone(mine) == normalize_phone(theirs),
                _ => false,
            },
            Role::Student => {
                self.same_school(student) && self.national_id.as_deref() == Some(student.national_id.as_str())
            }
        }
    }

    /// Students a teacher, parent or student is not allowed to touch are
    /// rejected even when the role allows the action in general.
    pub fn require_student(&self, action: Action, student: &students::Model) -> Result<()> {
        self.require(action)?;
        if self.can_view_student(student) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("student {} is outside your scope", student.id)))
        }
    }

    /// Filter a list down to the visible students.
    pub fn visible_students(&self, all: Vec<students::Model>) -> Vec<students::Model> {
        all.into_iter().filter(|s| self.can_view_student(s)).collect()
    }
}

/// Digits only, with an international `00` prefix dropped so that
/// `+966...` and `00966...` compare equal.
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    digits.trim_start_matches("00").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn viewer(role: Role) -> Viewer {
        Viewer {
            user_id: "u1".to_string(),
            role,
            school_id: Some("sch-1".to_string()),
            assigned_classes: ClassList(vec!["5A".to_string()]),
            phone: Some("+966 500 000 001".to_string()),
            national_id: Some("1122".to_string()),
        }
    }

    fn student(class_name: &str, school_id: &str) -> students::Model {
        students::Model {
            id: "s1".to_string(),
            name: "Omar".to_string(),
            national_id: "1122".to_string(),
            class_name: class_name.to_string(),
            parent_phone: Some("00966500000001".to_string()),
            school_id: school_id.to_string(),
            created_by_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_permission_matrix() {
        assert!(viewer(Role::Admin).can(Action::ManageSchools));
        assert!(!viewer(Role::SchoolManager).can(Action::ManageSchools));
        assert!(viewer(Role::SchoolManager).can(Action::ManageStaff));
        assert!(viewer(Role::Teacher).can(Action::RecordAttendance));
        assert!(!viewer(Role::Teacher).can(Action::ManageStaff));
        assert!(!viewer(Role::Teacher).can(Action::ManageSchedule));
        assert!(!viewer(Role::Parent).can(Action::RecordGrades));
        assert!(viewer(Role::Student).require(Action::ViewReports).is_err());
    }

    #[test]
    fn test_teacher_sees_assigned_classes() {
        let teacher = viewer(Role::Teacher);
        assert!(teacher.can_view_student(&student("5A", "sch-1")));
        assert!(!teacher.can_view_student(&student("6B", "sch-1")));
        assert!(!teacher.can_view_student(&student("5A", "sch-2")));

        let mut own = student("6B", "sch-1");
        own.created_by_id = Some("u1".to_string());
        assert!(teacher.can_view_student(&own));
    }

    #[test]
    fn test_manager_scoped_to_school() {
        let manager = viewer(Role::SchoolManager);
        assert!(manager.can_view_student(&student("6B", "sch-1")));
        assert!(!manager.can_view_student(&student("6B", "sch-2")));
    }

    #[test]
    fn test_parent_matches_phone() {
        let parent = viewer(Role::Parent);
        assert!(parent.can_view_student(&student("5A", "sch-1")));

        let mut other = student("5A", "sch-1");
        other.parent_phone = Some("0500000099".to_string());
        assert!(!parent.can_view_student(&other));
        other.parent_phone = None;
        assert!(!parent.can_view_student(&other));
    }

    #[test]
    fn test_student_sees_self_only() {
        let me = viewer(Role::Student);
        assert!(me.can_view_student(&student("5A", "sch-1")));
        // Same national id registered at another school is someone else.
        assert!(!me.can_view_student(&student("5A", "sch-2")));
        let mut other = student("5A", "sch-1");
        other.national_id = "9999".to_string();
        assert!(!me.can_view_student(&other));
    }

    #[test]
    fn test_require_student_scope() {
        let teacher = viewer(Role::Teacher);
        assert!(teacher.require_student(Action::RecordGrades, &student("5A", "sch-1")).is_ok());
        assert!(teacher.require_student(Action::RecordGrades, &student("7C", "sch-1")).is_err());
    }

    #[test]
    fn test_visible_students_filters() {
        let teacher = viewer(Role::Teacher);
        let all = vec![student("5A", "sch-1"), student("6B", "sch-1")];
        assert_eq!(teacher.visible_students(all).len(), 1);
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+966 500-000-001"), "966500000001");
        assert_eq!(normalize_phone("00966500000001"), "966500000001");
    }
}
