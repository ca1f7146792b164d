use crate::database::MongoDB;
use crate::models::{Nutritionist, NutritionistPublicInfo};
use crate::services::auth_service;
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use serde_json::json;

/// Marketplace listing, verified and active coaches only, best rated first.
#[utoipa::path(
    get,
    path = "/expert",
    tag = "Experts",
    responses(
        (status = 200, description = "Verified coaches", body = [NutritionistPublicInfo])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_experts(db: web::Data<MongoDB>) -> HttpResponse {
    log::info!("🧑‍⚕️ GET /expert");

    let result: Result<Vec<NutritionistPublicInfo>, AppError> = async {
        let mut cursor = db
            .collection::<Nutritionist>("nutritionists")
            .find(doc! { "is_verified": true, "is_active": true })
            .sort(doc! { "average_rating": -1, "rating_count": -1 })
            .await
            .map_err(AppError::db)?;

        let mut coaches = Vec::new();
        while let Some(coach) = cursor.try_next().await.map_err(AppError::db)? {
            coaches.push(NutritionistPublicInfo::from(coach));
        }
        Ok(coaches)
    }
    .await;

    match result {
        Ok(coaches) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": coaches.len(),
            "experts": coaches,
        })),
        Err(e) => e.to_response(),
    }
}

pub async fn get_expert(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    let nutritionist_id = path.into_inner();
    log::info!("🧑‍⚕️ GET /expert/{}", nutritionist_id);

    match auth_service::find_coach(&db, &nutritionist_id).await {
        Ok(Some(coach)) if coach.is_verified && coach.is_active => {
            HttpResponse::Ok().json(json!({
                "success": true,
                "expert": NutritionistPublicInfo::from(coach),
            }))
        }
        Ok(_) => HttpResponse::NotFound().json(json!({
            "success": false,
            "error": "Coach not found"
        })),
        Err(e) => e.to_response(),
    }
}
