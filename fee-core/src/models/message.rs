use chrono::{DateTime, Utc};
use serde::Serialize;

/// One entry in the conversation attached to a service request.
///
/// `is_read` is set once someone other than the sender has opened it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: i64,
    pub request_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Unread and written by someone other than `user_id`.
    pub fn is_unread_for(
        &self,
        user_id: i64,
    ) -> bool {
        !self.is_read && self.sender_id != user_id
    }
}

/// For creating new messages (no id, read flag or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMessage {
    pub request_id: i64,
    pub sender_id: i64,
    pub content: String,
}
