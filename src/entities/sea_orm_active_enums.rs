//! String-backed enums shared by entities and the wire format.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role, one per portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "SCHOOL_MANAGER")]
    SchoolManager,
    #[sea_orm(string_value = "TEACHER")]
    Teacher,
    #[sea_orm(string_value = "PARENT")]
    Parent,
    #[sea_orm(string_value = "STUDENT")]
    Student,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "PRESENT")]
    Present,
    #[sea_orm(string_value = "ABSENT")]
    Absent,
    #[sea_orm(string_value = "LATE")]
    Late,
    #[sea_orm(string_value = "EXCUSED")]
    Excused,
}

/// Disciplinary tag attached to an attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BehaviorStatus {
    #[sea_orm(string_value = "POSITIVE")]
    Positive,
    #[sea_orm(string_value = "NEGATIVE")]
    Negative,
    #[sea_orm(string_value = "NEUTRAL")]
    Neutral,
}

/// Classification of a performance record for the weighted composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerformanceCategory {
    #[sea_orm(string_value = "HOMEWORK")]
    Homework,
    #[sea_orm(string_value = "ACTIVITY")]
    Activity,
    #[sea_orm(string_value = "PLATFORM_EXAM")]
    PlatformExam,
    #[sea_orm(string_value = "YEAR_WORK")]
    YearWork,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageChannel {
    #[sea_orm(string_value = "SMS")]
    Sms,
    #[sea_orm(string_value = "WHATSAPP")]
    Whatsapp,
    #[sea_orm(string_value = "APP")]
    App,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "SENT")]
    Sent,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

impl AttendanceStatus {
    /// Get human-readable name for the status.
    pub fn name(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }
}

impl BehaviorStatus {
    pub fn name(&self) -> &'static str {
        match self {
            BehaviorStatus::Positive => "positive",
            BehaviorStatus::Negative => "negative",
            BehaviorStatus::Neutral => "neutral",
        }
    }
}

impl PerformanceCategory {
    pub fn name(&self) -> &'static str {
        match self {
            PerformanceCategory::Homework => "homework",
            PerformanceCategory::Activity => "activity",
            PerformanceCategory::PlatformExam => "platform exam",
            PerformanceCategory::YearWork => "year work",
            PerformanceCategory::Other => "other",
        }
    }
}
