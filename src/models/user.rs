//! School and account DTOs.

use crate::entities::sea_orm_active_enums::Role;
use serde::{Deserialize, Serialize};

/// DTO for creating a school.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchool {
    pub name: String,
    pub region: Option<String>,
    pub manager_id: Option<String>,
}

/// DTO for creating an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub school_id: Option<String>,
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    #[serde(default)]
    pub assigned_classes: Vec<String>,
}

/// DTO for updating an account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub phone: Option<Option<String>>,
    pub national_id: Option<Option<String>>,
    pub assigned_classes: Option<Vec<String>>,
}

impl CreateUser {
    /// Accounts other than admins belong to a school; parents and
    /// students need an identifier to log in with.
    pub fn validate(&self) -> crate::Result<()> {
        super::required("Name", &self.name)?;
        if self.role != Role::Admin && self.school_id.as_deref().is_none_or(|s| s.trim().is_empty()) {
            return Err(crate::AppError::validation("School is required for this role"));
        }
        let has_login = super::optional(self.phone.as_deref()).is_some()
            || super::optional(self.national_id.as_deref()).is_some();
        if matches!(self.role, Role::Parent | Role::Student) && !has_login {
            return Err(crate::AppError::validation(
                "Parent and student accounts need a phone or national id",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> CreateUser {
        CreateUser {
            school_id: Some("sch-1".to_string()),
            name: "Sara".to_string(),
            role,
            phone: None,
            national_id: None,
            assigned_classes: Vec::new(),
        }
    }

    #[test]
    fn test_teacher_without_login_ok() {
        assert!(user(Role::Teacher).validate().is_ok());
    }

    #[test]
    fn test_parent_needs_login() {
        let mut parent = user(Role::Parent);
        assert!(parent.validate().is_err());
        parent.phone = Some("0500000001".to_string());
        assert!(parent.validate().is_ok());
    }

    #[test]
    fn test_admin_without_school_ok() {
        let mut admin = user(Role::Admin);
        admin.school_id = None;
        assert!(admin.validate().is_ok());

        let mut teacher = user(Role::Teacher);
        teacher.school_id = None;
        assert!(teacher.validate().is_err());
    }
}
