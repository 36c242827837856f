//! Account repository.

use crate::entities::users::ClassList;
use crate::entities::{prelude::*, users};
use crate::models::{CreateUser, UpdateUser, new_id};
use sea_orm::*;

/// List a school's accounts ordered by role and name.
pub async fn list_by_school(db: &DatabaseConnection, school_id: &str) -> Result<Vec<users::Model>, DbErr> {
    Users::find()
        .filter(users::Column::SchoolId.eq(school_id))
        .order_by_asc(users::Column::Role)
        .order_by_asc(users::Column::Name)
        .all(db)
        .await
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<users::Model>, DbErr> {
    Users::find_by_id(id).one(db).await
}

/// Find an account by phone number or national id.
pub async fn find_by_login(db: &DatabaseConnection, identifier: &str) -> Result<Option<users::Model>, DbErr> {
    Users::find()
        .filter(
            Condition::any()
                .add(users::Column::Phone.eq(identifier))
                .add(users::Column::NationalId.eq(identifier)),
        )
        .one(db)
        .await
}

/// Accounts that have a phone number on file.
pub async fn list_with_phone(db: &DatabaseConnection) -> Result<Vec<users::Model>, DbErr> {
    Users::find()
        .filter(users::Column::Phone.is_not_null())
        .order_by_asc(users::Column::Name)
        .all(db)
        .await
}

/// Create a new account.
pub async fn create(db: &DatabaseConnection, data: CreateUser) -> Result<users::Model, DbErr> {
    let model = users::ActiveModel {
        id: Set(new_id()),
        school_id: Set(data.school_id),
        name: Set(data.name),
        role: Set(data.role),
        phone: Set(data.phone),
        national_id: Set(data.national_id),
        assigned_classes: Set(ClassList(data.assigned_classes)),
    };
    model.insert(db).await
}

/// Update an existing account.
pub async fn update(db: &DatabaseConnection, id: &str, data: UpdateUser) -> Result<Option<users::Model>, DbErr> {
    let Some(model) = Users::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    let mut active: users::ActiveModel = model.into();

    if let Some(name) = data.name {
        active.name = Set(name);
    }
    if let Some(role) = data.role {
        active.role = Set(role);
    }
    if let Some(phone) = data.phone {
        active.phone = Set(phone);
    }
    if let Some(national_id) = data.national_id {
        active.national_id = Set(national_id);
    }
    if let Some(classes) = data.assigned_classes {
        active.assigned_classes = Set(ClassList(classes));
    }

    Ok(Some(active.update(db).await?))
}

/// Delete an account by ID.
pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<bool, DbErr> {
    let result = Users::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}
