use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    /// TDEE multiplier applied to the Mifflin-St Jeor BMR.
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    LoseWeight,
    Maintain,
    GainMuscle,
}

/// Daily macro targets embedded on the user document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct NutritionPlan {
    pub calories: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
}

/// Personal (client) account stored in the `users` collection.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub name: String,
    #[serde(default = "default_user_roles")]
    pub roles: Vec<String>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,

    // Body metrics used by the nutrition plan calculator
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub activity_level: Option<ActivityLevel>,
    pub goal: Option<Goal>,
    pub nutrition_plan: Option<NutritionPlan>,

    // Coaching: set iff exactly one coach_request for that pair is `selected`
    pub active_coach_id: Option<String>,

    // Streak state
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    /// Last calendar day (YYYY-MM-DD) that counted towards the streak.
    pub last_streak_day_logged: Option<String>,
    #[serde(default)]
    pub achieved_streak_7: bool,
    pub first_meal_logged_at: Option<BsonDateTime>,

    pub expo_push_token: Option<String>,
    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
}

pub fn default_user_roles() -> Vec<String> {
    vec!["user".to_string()]
}

pub fn default_is_active() -> bool {
    true
}

/// Public view of a user, returned by /user/{id} and embedded in chat docs.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserPublicInfo {
    pub user_id: String,
    pub name: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub achieved_streak_7: bool,
    pub active_coach_id: Option<String>,
}

impl From<User> for UserPublicInfo {
    fn from(user: User) -> Self {
        UserPublicInfo {
            user_id: user.user_id,
            name: user.name,
            current_streak: user.current_streak,
            longest_streak: user.longest_streak,
            achieved_streak_7: user.achieved_streak_7,
            active_coach_id: user.active_coach_id,
        }
    }
}
