//! Parent message repository.

use crate::entities::sea_orm_active_enums::MessageStatus;
use crate::entities::{messages, prelude::*};
use crate::models::{CreateMessage, new_id};
use chrono::Utc;
use sea_orm::*;

/// List a school's messages, newest first, optionally for one student.
pub async fn list(
    db: &DatabaseConnection,
    school_id: &str,
    student_id: Option<&str>,
) -> Result<Vec<messages::Model>, DbErr> {
    let mut query = Messages::find().filter(messages::Column::SchoolId.eq(school_id));
    if let Some(student_id) = student_id {
        query = query.filter(messages::Column::StudentId.eq(student_id));
    }
    query.order_by_desc(messages::Column::CreatedAt).all(db).await
}

/// List messages still waiting for delivery.
pub async fn list_pending(db: &DatabaseConnection, school_id: &str) -> Result<Vec<messages::Model>, DbErr> {
    Messages::find()
        .filter(messages::Column::SchoolId.eq(school_id))
        .filter(messages::Column::Status.eq(MessageStatus::Pending))
        .order_by_asc(messages::Column::CreatedAt)
        .all(db)
        .await
}

/// Queue a new message.
pub async fn create(db: &DatabaseConnection, data: CreateMessage) -> Result<messages::Model, DbErr> {
    let model = messages::ActiveModel {
        id: Set(new_id()),
        school_id: Set(data.school_id),
        student_id: Set(data.student_id),
        sender_id: Set(data.sender_id),
        recipient_phone: Set(data.recipient_phone),
        body: Set(data.body),
        channel: Set(data.channel),
        status: Set(MessageStatus::Pending),
        created_at: Set(Utc::now()),
        sent_at: Set(None),
    };
    model.insert(db).await
}

/// Set a message's delivery status; `sent_at` is stamped when it becomes SENT.
pub async fn set_status(
    db: &DatabaseConnection,
    id: &str,
    status: MessageStatus,
) -> Result<Option<messages::Model>, DbErr> {
    let Some(model) = Messages::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    let mut active: messages::ActiveModel = model.into();
    active.status = Set(status);
    if status == MessageStatus::Sent {
        active.sent_at = Set(Some(Utc::now()));
    }
    Ok(Some(active.update(db).await?))
}
