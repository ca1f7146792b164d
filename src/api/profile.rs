use crate::services::auth_service::Claims;
use crate::services::profile_service::UpdateProfileRequest;
use crate::{database::MongoDB, services::auth_service, services::profile_service};
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Own account, full view (not the public projection).
pub async fn get_profile(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    log::info!("👤 GET /profile - {}", claims.sub);

    if claims.is_coach() {
        match auth_service::find_coach(&db, &claims.sub).await {
            Ok(Some(mut coach)) => {
                coach.password = None;
                HttpResponse::Ok().json(json!({ "success": true, "profile": coach }))
            }
            Ok(None) => HttpResponse::NotFound().json(json!({
                "success": false,
                "error": "Coach not found"
            })),
            Err(e) => e.to_response(),
        }
    } else {
        match auth_service::find_user(&db, &claims.sub).await {
            Ok(Some(mut user)) => {
                user.password = None;
                HttpResponse::Ok().json(json!({ "success": true, "profile": user }))
            }
            Ok(None) => HttpResponse::NotFound().json(json!({
                "success": false,
                "error": "User not found"
            })),
            Err(e) => e.to_response(),
        }
    }
}

#[utoipa::path(
    put,
    path = "/profile",
    tag = "Profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 400, description = "Invalid field value"),
        (status = 404, description = "Account not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<UpdateProfileRequest>,
) -> HttpResponse {
    log::info!("👤 PUT /profile - {}", claims.sub);

    if claims.is_coach() {
        match profile_service::update_coach_profile(&db, &claims.sub, &request).await {
            Ok(mut coach) => {
                coach.password = None;
                HttpResponse::Ok().json(json!({ "success": true, "profile": coach }))
            }
            Err(e) => {
                log::warn!("❌ Coach profile update failed: {} - {}", claims.sub, e);
                e.to_response()
            }
        }
    } else {
        match profile_service::update_user_profile(&db, &claims.sub, &request).await {
            Ok(mut user) => {
                user.password = None;
                HttpResponse::Ok().json(json!({
                    "success": true,
                    "profile": user,
                }))
            }
            Err(e) => {
                log::warn!("❌ Profile update failed: {} - {}", claims.sub, e);
                e.to_response()
            }
        }
    }
}
