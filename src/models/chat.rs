use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// One chat per user↔coach pair, keyed by the deterministic
/// `{user_id}_{nutritionist_id}` id so concurrent first messages collapse
/// onto the same document.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Chat {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub chat_id: String,
    pub user_id: String,
    pub nutritionist_id: String,

    // Denormalized display names so chat lists need no joins
    pub user_name: String,
    pub coach_name: String,

    pub last_message: Option<String>,
    pub last_message_at: Option<i64>,

    // Independent unread counters, one per side, mutated only via $inc
    #[serde(default)]
    pub user_unread_count: i64,
    #[serde(default)]
    pub coach_unread_count: i64,

    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

/// Append-only message log in the `chat_messages` collection.
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct ChatMessage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(ignore)]
    pub id: Option<ObjectId>,
    pub message_id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub text: String,
    pub created_at: i64,
}
