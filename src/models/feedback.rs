use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// User-submitted feedback, triaged by admins (open -> resolved).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Feedback {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub feedback_id: String,
    pub user_id: String,
    pub subject: String,
    pub message: String,
    /// "open" or "resolved"
    #[serde(default = "default_feedback_status")]
    pub status: String,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
}

pub fn default_feedback_status() -> String {
    "open".to_string()
}
