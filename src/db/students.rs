//! Student repository with CRUD operations.

use crate::entities::{prelude::*, students};
use crate::models::{CreateStudent, UpdateStudent, new_id};
use chrono::Utc;
use sea_orm::*;

/// List a school's students ordered by class and name.
pub async fn list_by_school(db: &DatabaseConnection, school_id: &str) -> Result<Vec<students::Model>, DbErr> {
    Students::find()
        .filter(students::Column::SchoolId.eq(school_id))
        .order_by_asc(students::Column::ClassName)
        .order_by_asc(students::Column::Name)
        .all(db)
        .await
}

/// List the students of one class.
pub async fn list_by_class(
    db: &DatabaseConnection,
    school_id: &str,
    class_name: &str,
) -> Result<Vec<students::Model>, DbErr> {
    Students::find()
        .filter(students::Column::SchoolId.eq(school_id))
        .filter(students::Column::ClassName.eq(class_name))
        .order_by_asc(students::Column::Name)
        .all(db)
        .await
}

/// Distinct class names of a school.
pub async fn class_names(db: &DatabaseConnection, school_id: &str) -> Result<Vec<String>, DbErr> {
    Students::find()
        .select_only()
        .column(students::Column::ClassName)
        .distinct()
        .filter(students::Column::SchoolId.eq(school_id))
        .order_by_asc(students::Column::ClassName)
        .into_tuple()
        .all(db)
        .await
}

/// Get student by ID.
pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<students::Model>, DbErr> {
    Students::find_by_id(id).one(db).await
}

/// Find students whose name or national id contains the query.
pub async fn search(db: &DatabaseConnection, school_id: &str, query: &str) -> Result<Vec<students::Model>, DbErr> {
    Students::find()
        .filter(students::Column::SchoolId.eq(school_id))
        .filter(
            Condition::any()
                .add(students::Column::Name.contains(query))
                .add(students::Column::NationalId.contains(query)),
        )
        .order_by_asc(students::Column::Name)
        .all(db)
        .await
}

/// Create a new student.
pub async fn create(db: &DatabaseConnection, data: CreateStudent) -> Result<students::Model, DbErr> {
    let model = students::ActiveModel {
        id: Set(new_id()),
        name: Set(data.name),
        national_id: Set(data.national_id),
        class_name: Set(data.class_name),
        parent_phone: Set(data.parent_phone),
        school_id: Set(data.school_id),
        created_by_id: Set(data.created_by_id),
        created_at: Set(Utc::now()),
    };
    model.insert(db).await
}

/// Update an existing student.
pub async fn update(
    db: &DatabaseConnection,
    id: &str,
    data: UpdateStudent,
) -> Result<Option<students::Model>, DbErr> {
    let existing = Students::find_by_id(id).one(db).await?;

    match existing {
        Some(model) => {
            let mut active: students::ActiveModel = model.into();

            if let Some(name) = data.name {
                active.name = Set(name);
            }
            if let Some(national_id) = data.national_id {
                active.national_id = Set(national_id);
            }
            if let Some(class_name) = data.class_name {
                active.class_name = Set(class_name);
            }
            if let Some(parent_phone) = data.parent_phone {
                active.parent_phone = Set(parent_phone);
            }

            let updated = active.update(db).await?;
            Ok(Some(updated))
        }
        None => Ok(None),
    }
}

/// Delete a student by ID.
pub async fn delete<C: ConnectionTrait>(db: &C, id: &str) -> Result<bool, DbErr> {
    let result = Students::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Check if a national id is already used in the school (for validation).
pub async fn national_id_exists(
    db: &DatabaseConnection,
    school_id: &str,
    national_id: &str,
    exclude_id: Option<&str>,
) -> Result<bool, DbErr> {
    let mut query = Students::find()
        .filter(students::Column::SchoolId.eq(school_id))
        .filter(students::Column::NationalId.eq(national_id));

    if let Some(id) = exclude_id {
        query = query.filter(students::Column::Id.ne(id));
    }

    let count = query.count(db).await?;
    Ok(count > 0)
}
