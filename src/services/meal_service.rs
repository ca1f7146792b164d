use crate::{
    database::MongoDB,
    models::{DailyConsumption, MealEntry, MealType, User},
    utils::{dates, error::AppError},
};
use chrono::NaiveDate;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use mongodb::options::ReturnDocument;
use serde::{Deserialize, Serialize};

const CONSUMPTION: &str = "daily_consumption";

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LogMealRequest {
    /// Calendar day the meal belongs to, YYYY-MM-DD
    pub date: String,
    pub meal_type: MealType,
    pub name: String,
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
}

/// Logs one meal: a single upsert increments the day's nutrient totals and
/// appends the entry to its meal-type array, so concurrent logs for the same
/// day never lose updates.
pub async fn log_meal(
    db: &MongoDB,
    user_id: &str,
    request: &LogMealRequest,
) -> Result<MealEntry, AppError> {
    dates::parse_day(&request.date)?;
    validate_nutrient("calories", request.calories)?;
    validate_nutrient("protein_g", request.protein_g)?;
    validate_nutrient("carbs_g", request.carbs_g)?;
    validate_nutrient("fat_g", request.fat_g)?;
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Meal name is required".into()));
    }

    let now = chrono::Utc::now().timestamp();
    let entry = MealEntry {
        meal_id: uuid::Uuid::new_v4().to_string(),
        name: request.name.trim().to_string(),
        calories: request.calories,
        protein_g: request.protein_g,
        carbs_g: request.carbs_g,
        fat_g: request.fat_g,
        logged_at: now,
    };

    let entry_bson = mongodb::bson::to_bson(&entry)
        .map_err(|e| AppError::Database(format!("Failed to serialize meal: {}", e)))?;

    db.collection::<DailyConsumption>(CONSUMPTION)
        .update_one(
            doc! { "user_id": user_id, "date": &request.date },
            doc! {
                "$inc": {
                    "totals.consumed_calories": request.calories,
                    "totals.consumed_protein": request.protein_g,
                    "totals.consumed_carbs": request.carbs_g,
                    "totals.consumed_fat": request.fat_g,
                },
                "$push": { request.meal_type.as_field(): entry_bson },
                "$setOnInsert": { "created_at": now },
                "$set": { "updated_at": now },
            },
        )
        .upsert(true)
        .await
        .map_err(AppError::db)?;

    // First-ever meal flag, set once (filter on null makes the write idempotent)
    db.collection::<User>("users")
        .update_one(
            doc! { "user_id": user_id, "first_meal_logged_at": mongodb::bson::Bson::Null },
            doc! { "$set": { "first_meal_logged_at": BsonDateTime::now() } },
        )
        .await
        .map_err(AppError::db)?;

    log::info!("🍽️  Meal logged for {} on {}: {} ({} kcal)", user_id, request.date, entry.name, entry.calories);

    Ok(entry)
}

pub async fn get_daily_consumption(
    db: &MongoDB,
    user_id: &str,
    date: &str,
) -> Result<DailyConsumption, AppError> {
    dates::parse_day(date)?;
    db.collection::<DailyConsumption>(CONSUMPTION)
        .find_one(doc! { "user_id": user_id, "date": date })
        .await
        .map_err(AppError::db)?
        .ok_or_else(|| AppError::NotFound(format!("No meals logged on {}", date)))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub achieved_streak_7: bool,
}

/// Pure streak transition so the calendar arithmetic is testable without a
/// database. A backdated log (new day before the last streak day) is a
/// no-op: it never damages an earned streak.
pub fn next_streak(
    current: u32,
    longest: u32,
    achieved_7: bool,
    last_day: Option<NaiveDate>,
    new_day: NaiveDate,
) -> (StreakState, NaiveDate) {
    let new_current = match last_day {
        None => 1,
        Some(last) => match dates::day_delta(last, new_day) {
            1 => current + 1,
            0 => current.max(1),
            d if d > 1 => 1,
            // d < 0: backdated log
            _ => current.max(1),
        },
    };

    // A backdated log keeps the existing anchor day
    let anchor = match last_day {
        Some(last) if new_day < last => last,
        _ => new_day,
    };

    (
        StreakState {
            current_streak: new_current,
            longest_streak: longest.max(new_current),
            achieved_streak_7: achieved_7 || new_current >= 7,
        },
        anchor,
    )
}

/// Recomputes the consecutive-day streak after a meal log for `date`.
pub async fn update_streak(db: &MongoDB, user_id: &str, date: &str) -> Result<StreakState, AppError> {
    let new_day = dates::parse_day(date)?;

    let users = db.collection::<User>("users");
    let user = users
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(AppError::db)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let last_day = match &user.last_streak_day_logged {
        Some(day) => Some(dates::parse_day(day)?),
        None => None,
    };

    let (state, anchor) = next_streak(
        user.current_streak,
        user.longest_streak,
        user.achieved_streak_7,
        last_day,
        new_day,
    );

    let updated = users
        .find_one_and_update(
            doc! { "user_id": user_id },
            doc! { "$set": {
                "current_streak": state.current_streak,
                "longest_streak": state.longest_streak,
                "achieved_streak_7": state.achieved_streak_7,
                "last_streak_day_logged": anchor.format("%Y-%m-%d").to_string(),
                "updated_at": BsonDateTime::now(),
            }},
        )
        .return_document(ReturnDocument::After)
        .await
        .map_err(AppError::db)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if state.achieved_streak_7 && !user.achieved_streak_7 {
        log::info!("🏅 User {} reached the 7-day streak badge", user_id);
    }
    log::info!("🔥 Streak for {}: {} (longest {})", user_id, updated.current_streak, updated.longest_streak);

    Ok(StreakState {
        current_streak: updated.current_streak,
        longest_streak: updated.longest_streak,
        achieved_streak_7: updated.achieved_streak_7,
    })
}

fn validate_nutrient(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(format!("{} must be a non-negative number", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_first_log_starts_streak_at_one() {
        let (state, anchor) = next_streak(0, 0, false, None, day("2025-03-09"));
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 1);
        assert!(!state.achieved_streak_7);
        assert_eq!(anchor, day("2025-03-09"));
    }

    #[test]
    fn test_consecutive_day_increments() {
        let (state, _) = next_streak(3, 5, false, Some(day("2025-03-09")), day("2025-03-10"));
        assert_eq!(state.current_streak, 4);
        assert_eq!(state.longest_streak, 5);
    }

    #[test]
    fn test_same_day_is_noop() {
        let (state, anchor) = next_streak(4, 4, false, Some(day("2025-03-09")), day("2025-03-09"));
        assert_eq!(state.current_streak, 4);
        assert_eq!(anchor, day("2025-03-09"));
    }

    #[test]
    fn test_same_day_clamps_to_at_least_one() {
        let (state, _) = next_streak(0, 0, false, Some(day("2025-03-09")), day("2025-03-09"));
        assert_eq!(state.current_streak, 1);
    }

    #[test]
    fn test_gap_resets_to_one() {
        let (state, _) = next_streak(6, 6, false, Some(day("2025-03-09")), day("2025-03-12"));
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 6);
    }

    #[test]
    fn test_backdated_log_does_not_damage_streak() {
        let (state, anchor) = next_streak(5, 5, false, Some(day("2025-03-09")), day("2025-03-07"));
        assert_eq!(state.current_streak, 5);
        assert_eq!(anchor, day("2025-03-09"));
    }

    #[test]
    fn test_badge_awarded_exactly_at_seven() {
        let (state, _) = next_streak(6, 6, false, Some(day("2025-03-09")), day("2025-03-10"));
        assert_eq!(state.current_streak, 7);
        assert!(state.achieved_streak_7);

        // Already-earned badge stays on after a reset
        let (after_reset, _) = next_streak(7, 7, true, Some(day("2025-03-10")), day("2025-03-20"));
        assert_eq!(after_reset.current_streak, 1);
        assert!(after_reset.achieved_streak_7);
    }

    #[test]
    fn test_longest_streak_is_running_max() {
        let (state, _) = next_streak(9, 9, true, Some(day("2025-03-09")), day("2025-03-10"));
        assert_eq!(state.longest_streak, 10);
    }

    async fn test_db() -> MongoDB {
        let uri = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/BiteWiseTest".to_string());
        MongoDB::new(&uri).await.expect("test database connection")
    }

    fn breakfast(name: &str, calories: f64) -> LogMealRequest {
        LogMealRequest {
            date: "2026-08-29".to_string(),
            meal_type: MealType::Breakfast,
            name: name.to_string(),
            calories,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
        }
    }

    #[actix_rt::test]
    #[ignore] // needs a running MongoDB, point TEST_DATABASE_URL at it
    async fn test_log_meal_accumulates_totals_and_entries() {
        let db = test_db().await;
        let user_id = format!("meal-user-{}", uuid::Uuid::new_v4());

        log_meal(&db, &user_id, &breakfast("Oats", 500.0)).await.unwrap();
        log_meal(&db, &user_id, &breakfast("Eggs", 300.0)).await.unwrap();

        let day = get_daily_consumption(&db, &user_id, "2026-08-29").await.unwrap();
        assert_eq!(day.totals.consumed_calories, 800.0);
        assert_eq!(day.breakfast.len(), 2);
        assert!(day.lunch.is_empty());

        db.collection::<DailyConsumption>(CONSUMPTION)
            .delete_many(doc! { "user_id": &user_id })
            .await
            .unwrap();
    }
}
