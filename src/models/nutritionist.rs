use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

/// Coach account stored in the `nutritionists` collection.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Nutritionist {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub nutritionist_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub name: String,
    #[serde(default = "default_coach_roles")]
    pub roles: Vec<String>,
    #[serde(default = "crate::models::user::default_is_active")]
    pub is_active: bool,

    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub years_experience: Option<u32>,

    /// Admin-controlled verification workflow: pending -> approved | rejected
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default = "default_verification_status")]
    pub verification_status: String,
    pub rejected_at: Option<i64>,

    /// Users whose `active_coach_id` is this coach. Kept consistent with the
    /// request lifecycle via $addToSet/$pull alongside each transition.
    #[serde(default)]
    pub client_ids: Vec<String>,

    // Rating aggregate, denormalized for listing queries
    #[serde(default)]
    pub rating_sum: i64,
    #[serde(default)]
    pub rating_count: i64,
    #[serde(default)]
    pub average_rating: f64,

    pub expo_push_token: Option<String>,
    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
}

fn default_coach_roles() -> Vec<String> {
    vec!["nutritionist".to_string()]
}

pub fn default_verification_status() -> String {
    "pending".to_string()
}

/// Listing view returned by /expert endpoints.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct NutritionistPublicInfo {
    pub nutritionist_id: String,
    pub name: String,
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub years_experience: Option<u32>,
    pub is_verified: bool,
    pub average_rating: f64,
    pub rating_count: i64,
    pub client_count: usize,
}

impl From<Nutritionist> for NutritionistPublicInfo {
    fn from(coach: Nutritionist) -> Self {
        NutritionistPublicInfo {
            nutritionist_id: coach.nutritionist_id,
            name: coach.name,
            specialization: coach.specialization,
            bio: coach.bio,
            years_experience: coach.years_experience,
            is_verified: coach.is_verified,
            average_rating: coach.average_rating,
            rating_count: coach.rating_count,
            client_count: coach.client_ids.len(),
        }
    }
}
