//! School repository.

use crate::entities::{prelude::*, schools};
use crate::models::{CreateSchool, new_id};
use chrono::Utc;
use sea_orm::*;

/// List all schools ordered by name.
pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<schools::Model>, DbErr> {
    Schools::find().order_by_asc(schools::Column::Name).all(db).await
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<schools::Model>, DbErr> {
    Schools::find_by_id(id).one(db).await
}

/// Create a new school.
pub async fn create(db: &DatabaseConnection, data: CreateSchool) -> Result<schools::Model, DbErr> {
    let model = schools::ActiveModel {
        id: Set(new_id()),
        name: Set(data.name),
        region: Set(data.region),
        manager_id: Set(data.manager_id),
        created_at: Set(Utc::now()),
    };
    model.insert(db).await
}

/// Delete a school by ID.
pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<bool, DbErr> {
    let result = Schools::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}
