//! Academic term repository.

use crate::entities::terms::Periods;
use crate::entities::{prelude::*, terms};
use crate::models::{CreateTerm, UpdateTerm, new_id};
use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::*;

/// List a school's terms, most recent first.
pub async fn list_by_school(db: &DatabaseConnection, school_id: &str) -> Result<Vec<terms::Model>, DbErr> {
    Terms::find()
        .filter(terms::Column::SchoolId.eq(school_id))
        .order_by_desc(terms::Column::StartDate)
        .all(db)
        .await
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<terms::Model>, DbErr> {
    Terms::find_by_id(id).one(db).await
}

/// The term flagged current, else the term whose range contains `today`.
pub async fn current(db: &DatabaseConnection, school_id: &str, today: NaiveDate) -> Result<Option<terms::Model>, DbErr> {
    let flagged = Terms::find()
        .filter(terms::Column::SchoolId.eq(school_id))
        .filter(terms::Column::IsCurrent.eq(true))
        .one(db)
        .await?;
    if flagged.is_some() {
        return Ok(flagged);
    }

    Terms::find()
        .filter(terms::Column::SchoolId.eq(school_id))
        .filter(terms::Column::StartDate.lte(today))
        .filter(terms::Column::EndDate.gte(today))
        .one(db)
        .await
}

/// Create a new term.
pub async fn create<C: ConnectionTrait>(db: &C, data: CreateTerm) -> Result<terms::Model, DbErr> {
    let model = terms::ActiveModel {
        id: Set(new_id()),
        school_id: Set(data.school_id),
        name: Set(data.name),
        start_date: Set(data.start_date),
        end_date: Set(data.end_date),
        periods: Set(Periods(data.periods)),
        is_current: Set(data.is_current),
    };
    model.insert(db).await
}

/// Apply an update to a loaded term.
pub async fn update<C: ConnectionTrait>(db: &C, model: terms::Model, data: UpdateTerm) -> Result<terms::Model, DbErr> {
    let mut active: terms::ActiveModel = model.into();

    if let Some(name) = data.name {
        active.name = Set(name);
    }
    if let Some(start_date) = data.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(end_date) = data.end_date {
        active.end_date = Set(end_date);
    }
    if let Some(periods) = data.periods {
        active.periods = Set(Periods(periods));
    }
    if let Some(is_current) = data.is_current {
        active.is_current = Set(is_current);
    }

    active.update(db).await
}

/// Clear the current flag on every other term of the school.
/// Returns the ids that changed.
pub async fn clear_current_except<C: ConnectionTrait>(db: &C, school_id: &str, keep_id: &str) -> Result<Vec<String>, DbErr> {
    let ids: Vec<String> = Terms::find()
        .select_only()
        .column(terms::Column::Id)
        .filter(terms::Column::SchoolId.eq(school_id))
        .filter(terms::Column::IsCurrent.eq(true))
        .filter(terms::Column::Id.ne(keep_id))
        .into_tuple()
        .all(db)
        .await?;

    if !ids.is_empty() {
        Terms::update_many()
            .col_expr(terms::Column::IsCurrent, Expr::value(false))
            .filter(terms::Column::Id.is_in(ids.iter().cloned()))
            .exec(db)
            .await?;
    }
    Ok(ids)
}

/// Delete a term by ID.
pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<bool, DbErr> {
    let result = Terms::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}
