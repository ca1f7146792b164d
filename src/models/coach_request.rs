use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a user↔coach relationship, tracked by one request document.
///
/// `none -> pending -> {accepted, declined}`; `accepted -> selected`;
/// `selected -> {ended_by_user, ended_by_coach, blocked_by_user}`;
/// an ended relationship may be flipped to `rated`. Every terminal state
/// allows a brand-new pending request (no document reuse).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Selected,
    Declined,
    EndedByUser,
    EndedByCoach,
    BlockedByUser,
    Rated,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Selected => "selected",
            RequestStatus::Declined => "declined",
            RequestStatus::EndedByUser => "ended_by_user",
            RequestStatus::EndedByCoach => "ended_by_coach",
            RequestStatus::BlockedByUser => "blocked_by_user",
            RequestStatus::Rated => "rated",
        }
    }

    /// Terminal states never advance; only a new pending request can follow.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            RequestStatus::Pending | RequestStatus::Accepted | RequestStatus::Selected
        )
    }

    /// Statuses that count as a live request for the duplicate check.
    pub const NON_TERMINAL: [&'static str; 3] = ["pending", "accepted", "selected"];
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CoachRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub request_id: String,
    pub user_id: String,
    pub nutritionist_id: String,
    pub status: RequestStatus,

    // Unix timestamps, one per transition
    pub created_at: i64,
    pub responded_at: Option<i64>,
    pub selected_at: Option<i64>,
    pub ended_at: Option<i64>,
    pub rated_at: Option<i64>,
}

impl CoachRequest {
    pub fn new(user_id: &str, nutritionist_id: &str) -> Self {
        CoachRequest {
            id: None,
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            nutritionist_id: nutritionist_id.to_string(),
            status: RequestStatus::Pending,
            created_at: chrono::Utc::now().timestamp(),
            responded_at: None,
            selected_at: None,
            ended_at: None,
            rated_at: None,
        }
    }
}

/// Block-list marker, orthogonal to the request lifecycle. Consulted by
/// send_request so a blocked coach cannot be re-requested.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BlockedCoach {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub nutritionist_id: String,
    pub blocked_at: i64,
}

/// One rating doc per (coach, user) pair; re-rating replaces the stars.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CoachRating {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub nutritionist_id: String,
    pub user_id: String,
    pub stars: i64,
    pub comment: Option<String>,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::Accepted.is_terminal());
        assert!(!RequestStatus::Selected.is_terminal());
        assert!(RequestStatus::Declined.is_terminal());
        assert!(RequestStatus::EndedByUser.is_terminal());
        assert!(RequestStatus::EndedByCoach.is_terminal());
        assert!(RequestStatus::BlockedByUser.is_terminal());
        assert!(RequestStatus::Rated.is_terminal());
    }

    #[test]
    fn test_wire_names_match_status_filters() {
        // The doc! filters use these literals; keep them in sync with serde.
        for status in [
            RequestStatus::Pending,
            RequestStatus::Accepted,
            RequestStatus::Selected,
            RequestStatus::Declined,
            RequestStatus::EndedByUser,
            RequestStatus::EndedByCoach,
            RequestStatus::BlockedByUser,
            RequestStatus::Rated,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::String(status.as_str().to_string()));
        }
    }

    #[test]
    fn test_new_request_starts_pending() {
        let request = CoachRequest::new("u1", "c1");
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.responded_at.is_none());
        assert!(!request.request_id.is_empty());
    }
}
