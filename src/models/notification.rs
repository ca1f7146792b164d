use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Persisted notification history. Written whether or not the Expo push
/// itself succeeded; `pushed` records the delivery attempt outcome.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub notification_id: String,
    pub recipient_id: String,
    /// "user" or "nutritionist"
    pub recipient_role: String,
    /// Event kind: coach_request, request_accepted, request_declined,
    /// relationship_ended, new_message, motivation, coach_approved, ...
    pub kind: String,
    pub title: String,
    pub body: String,
    pub pushed: bool,
    #[serde(default)]
    pub read: bool,
    pub created_at: i64,
}

/// Seeded broadcast text used by the motivation scheduler.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MotivationalMessage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub text: String,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: i64,
}
