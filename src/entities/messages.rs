use super::sea_orm_active_enums::{MessageChannel, MessageStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outgoing message to a student's parent. Delivery is done by the backend.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub school_id: String,
    pub student_id: String,
    pub sender_id: Option<String>,
    pub recipient_phone: String,
    pub body: String,
    pub channel: MessageChannel,
    pub status: MessageStatus,
    pub created_at: DateTimeUtc,
    pub sent_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
