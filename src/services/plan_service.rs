use crate::{
    database::MongoDB,
    models::{ActivityLevel, Gender, Goal, NutritionPlan, User},
    utils::error::AppError,
};
use mongodb::bson::{doc, DateTime as BsonDateTime};

/// Floor below which the calorie target is never cut, regardless of goal.
const MIN_CALORIES: f64 = 1200.0;

/// Computes daily macro targets from body metrics.
///
/// BMR is Mifflin-St Jeor, scaled by the activity multiplier into TDEE, then
/// adjusted for the goal (lose -500, gain +300) and clamped at 1200 kcal.
/// Protein is weight-based (1.6 g/kg, 1.8 for muscle gain), fat is 30% of
/// calories, carbs take the remainder.
pub fn calculate_nutrition_plan(
    weight_kg: f64,
    height_cm: f64,
    age: u32,
    gender: Gender,
    activity: ActivityLevel,
    goal: Goal,
) -> Result<NutritionPlan, AppError> {
    if !(20.0..=400.0).contains(&weight_kg) {
        return Err(AppError::Validation("weight_kg must be between 20 and 400".into()));
    }
    if !(100.0..=250.0).contains(&height_cm) {
        return Err(AppError::Validation("height_cm must be between 100 and 250".into()));
    }
    if !(13..=120).contains(&age) {
        return Err(AppError::Validation("age must be between 13 and 120".into()));
    }

    let bmr = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64
        + match gender {
            Gender::Male => 5.0,
            Gender::Female => -161.0,
        };

    let tdee = bmr * activity.multiplier();

    let adjusted = match goal {
        Goal::LoseWeight => tdee - 500.0,
        Goal::Maintain => tdee,
        Goal::GainMuscle => tdee + 300.0,
    };

    let calories = adjusted.max(MIN_CALORIES).round();

    let protein_per_kg = match goal {
        Goal::GainMuscle => 1.8,
        _ => 1.6,
    };
    let protein_g = (weight_kg * protein_per_kg).round();
    let fat_g = (calories * 0.30 / 9.0).round();
    let carbs_g = ((calories - protein_g * 4.0 - fat_g * 9.0) / 4.0).max(0.0).round();

    Ok(NutritionPlan { calories, protein_g, fat_g, carbs_g })
}

/// Recomputes and persists the plan from the metrics stored on the user doc.
pub async fn recalculate_for_user(db: &MongoDB, user_id: &str) -> Result<NutritionPlan, AppError> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(AppError::db)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let (weight, height, age, gender, activity, goal) = match (
        user.weight_kg,
        user.height_cm,
        user.age,
        user.gender,
        user.activity_level,
        user.goal,
    ) {
        (Some(w), Some(h), Some(a), Some(g), Some(act), Some(goal)) => (w, h, a, g, act, goal),
        _ => {
            return Err(AppError::Validation(
                "Profile is missing body metrics (weight, height, age, gender, activity level, goal)".into(),
            ))
        }
    };

    let plan = calculate_nutrition_plan(weight, height, age, gender, activity, goal)?;

    let plan_bson = mongodb::bson::to_bson(&plan)
        .map_err(|e| AppError::Database(format!("Failed to serialize plan: {}", e)))?;

    collection
        .update_one(
            doc! { "user_id": user_id },
            doc! { "$set": { "nutrition_plan": plan_bson, "updated_at": BsonDateTime::now() } },
        )
        .await
        .map_err(AppError::db)?;

    log::info!("✅ Nutrition plan recalculated for user {}: {} kcal", user_id, plan.calories);

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_respects_calorie_floor() {
        // Small, sedentary profile on a cut would fall below 1200 unclamped
        let plan = calculate_nutrition_plan(
            45.0, 150.0, 70, Gender::Female, ActivityLevel::Sedentary, Goal::LoseWeight,
        )
        .unwrap();
        assert!(plan.calories >= 1200.0);
    }

    #[test]
    fn test_macro_ratios() {
        let plan = calculate_nutrition_plan(
            80.0, 180.0, 30, Gender::Male, ActivityLevel::Moderate, Goal::Maintain,
        )
        .unwrap();
        assert_eq!(plan.protein_g, (80.0f64 * 1.6).round());
        assert_eq!(plan.fat_g, (plan.calories * 0.30 / 9.0).round());
        // Carbs take whatever calories remain after protein and fat
        let remainder = (plan.calories - plan.protein_g * 4.0 - plan.fat_g * 9.0) / 4.0;
        assert_eq!(plan.carbs_g, remainder.round());
    }

    #[test]
    fn test_gain_goal_uses_higher_protein() {
        let gain = calculate_nutrition_plan(
            70.0, 175.0, 25, Gender::Male, ActivityLevel::Active, Goal::GainMuscle,
        )
        .unwrap();
        let maintain = calculate_nutrition_plan(
            70.0, 175.0, 25, Gender::Male, ActivityLevel::Active, Goal::Maintain,
        )
        .unwrap();
        assert_eq!(gain.protein_g, (70.0f64 * 1.8).round());
        assert!(gain.calories > maintain.calories);
    }

    #[test]
    fn test_mifflin_st_jeor_reference_value() {
        // 80kg, 180cm, 30y male: BMR = 800 + 1125 - 150 + 5 = 1780
        let plan = calculate_nutrition_plan(
            80.0, 180.0, 30, Gender::Male, ActivityLevel::Sedentary, Goal::Maintain,
        )
        .unwrap();
        assert_eq!(plan.calories, (1780.0f64 * 1.2).round());
    }

    #[test]
    fn test_rejects_out_of_range_metrics() {
        assert!(calculate_nutrition_plan(5.0, 180.0, 30, Gender::Male, ActivityLevel::Light, Goal::Maintain).is_err());
        assert!(calculate_nutrition_plan(80.0, 90.0, 30, Gender::Male, ActivityLevel::Light, Goal::Maintain).is_err());
        assert!(calculate_nutrition_plan(80.0, 180.0, 8, Gender::Male, ActivityLevel::Light, Goal::Maintain).is_err());
    }
}
