use crate::services::assistant_service::{ChatAttachment, ChatMessage};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ChatPayload {
    #[validate(length(min = 1, message = "At least one message is required"))]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub attachments: Vec<ChatAttachment>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub content: String,
}
