//! Student DTOs for create and update operations.

use serde::{Deserialize, Serialize};

/// DTO for creating a student.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudent {
    pub name: String,
    pub national_id: String,
    pub class_name: String,
    pub parent_phone: Option<String>,
    pub school_id: String,
    pub created_by_id: Option<String>,
}

/// DTO for updating a student.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudent {
    pub name: Option<String>,
    pub national_id: Option<String>,
    pub class_name: Option<String>,
    pub parent_phone: Option<Option<String>>,
}
