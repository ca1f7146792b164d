use crate::{
    database::MongoDB,
    models::{ActivityLevel, Gender, Goal, Nutritionist, User},
    services::{auth_service, plan_service},
    utils::error::AppError,
};
use mongodb::bson::{doc, Document};
use serde::Deserialize;

/// Partial update: absent fields keep their stored value.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,

    // Personal accounts
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub activity_level: Option<ActivityLevel>,
    pub goal: Option<Goal>,

    // Coach accounts
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub years_experience: Option<u32>,
}

fn push_name(set: &mut Document, name: &Option<String>) -> Result<(), AppError> {
    if let Some(name) = name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name cannot be empty".into()));
        }
        set.insert("name", name);
    }
    Ok(())
}

/// Updates a personal account and recomputes the nutrition plan whenever the
/// stored metrics end up complete. Returns the fresh document.
pub async fn update_user_profile(
    db: &MongoDB,
    user_id: &str,
    request: &UpdateProfileRequest,
) -> Result<User, AppError> {
    let mut set = doc! { "updated_at": mongodb::bson::DateTime::now() };
    push_name(&mut set, &request.name)?;

    if let Some(weight) = request.weight_kg {
        set.insert("weight_kg", weight);
    }
    if let Some(height) = request.height_cm {
        set.insert("height_cm", height);
    }
    if let Some(age) = request.age {
        set.insert("age", age as i64);
    }
    if let Some(gender) = request.gender {
        set.insert("gender", mongodb::bson::ser::to_bson(&gender).map_err(serialize_err)?);
    }
    if let Some(activity) = request.activity_level {
        set.insert("activity_level", mongodb::bson::ser::to_bson(&activity).map_err(serialize_err)?);
    }
    if let Some(goal) = request.goal {
        set.insert("goal", mongodb::bson::ser::to_bson(&goal).map_err(serialize_err)?);
    }

    let result = db
        .collection::<User>("users")
        .update_one(doc! { "user_id": user_id }, doc! { "$set": set })
        .await
        .map_err(AppError::db)?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    // Recompute against the merged document, not just the request
    let user = auth_service::find_user(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if metrics_complete(&user) {
        plan_service::recalculate_for_user(db, user_id).await?;
    }

    auth_service::find_user(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn update_coach_profile(
    db: &MongoDB,
    nutritionist_id: &str,
    request: &UpdateProfileRequest,
) -> Result<Nutritionist, AppError> {
    let mut set = doc! { "updated_at": mongodb::bson::DateTime::now() };
    push_name(&mut set, &request.name)?;

    if let Some(specialization) = &request.specialization {
        set.insert("specialization", specialization.trim());
    }
    if let Some(bio) = &request.bio {
        set.insert("bio", bio.trim());
    }
    if let Some(years) = request.years_experience {
        set.insert("years_experience", years as i64);
    }

    let updated = db
        .collection::<Nutritionist>("nutritionists")
        .find_one_and_update(doc! { "nutritionist_id": nutritionist_id }, doc! { "$set": set })
        .return_document(mongodb::options::ReturnDocument::After)
        .await
        .map_err(AppError::db)?;

    updated.ok_or_else(|| AppError::NotFound("Coach not found".into()))
}

fn metrics_complete(user: &User) -> bool {
    user.weight_kg.is_some()
        && user.height_cm.is_some()
        && user.age.is_some()
        && user.gender.is_some()
        && user.activity_level.is_some()
        && user.goal.is_some()
}

fn serialize_err(e: mongodb::bson::ser::Error) -> AppError {
    AppError::Database(format!("Failed to serialize field: {}", e))
}
