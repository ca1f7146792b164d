use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealType {
    /// Field name of the per-meal-type array on the daily_consumption doc.
    pub fn as_field(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snacks => "snacks",
        }
    }
}

/// One logged meal, appended to the meal-type array of its day.
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct MealEntry {
    pub meal_id: String,
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub logged_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, utoipa::ToSchema)]
pub struct NutrientTotals {
    #[serde(default)]
    pub consumed_calories: f64,
    #[serde(default)]
    pub consumed_protein: f64,
    #[serde(default)]
    pub consumed_carbs: f64,
    #[serde(default)]
    pub consumed_fat: f64,
}

/// Per-user, per-date aggregate. One doc per (user_id, date), created on the
/// first meal of the day and mutated by every subsequent log via $inc/$push.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DailyConsumption {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    /// Calendar date string, YYYY-MM-DD
    pub date: String,
    #[serde(default)]
    pub totals: NutrientTotals,
    #[serde(default)]
    pub breakfast: Vec<MealEntry>,
    #[serde(default)]
    pub lunch: Vec<MealEntry>,
    #[serde(default)]
    pub dinner: Vec<MealEntry>,
    #[serde(default)]
    pub snacks: Vec<MealEntry>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}
