use super::sea_orm_active_enums::Role;
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// None for platform administrators.
    pub school_id: Option<String>,
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    #[sea_orm(column_type = "Json")]
    #[serde(default)]
    pub assigned_classes: ClassList,
}

/// Class names a teacher is responsible for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ClassList(pub Vec<String>);

impl ClassList {
    pub fn contains(&self, class_name: &str) -> bool {
        self.0.iter().any(|c| c == class_name)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
