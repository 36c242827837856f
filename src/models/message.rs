//! Parent message DTOs.

use crate::entities::sea_orm_active_enums::MessageChannel;
use serde::{Deserialize, Serialize};

/// DTO for queueing a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessage {
    pub school_id: String,
    pub student_id: String,
    pub sender_id: Option<String>,
    pub recipient_phone: String,
    pub body: String,
    pub channel: MessageChannel,
}
