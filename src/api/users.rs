use crate::models::UserPublicInfo;
use crate::services::auth_service;
use crate::database::MongoDB;
use actix_web::{web, HttpResponse};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/user/{user_id}",
    tag = "Users",
    params(
        ("user_id" = String, Path, description = "Public user id")
    ),
    responses(
        (status = 200, description = "Public user info", body = UserPublicInfo),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    let user_id = path.into_inner();
    log::info!("👤 GET /user/{}", user_id);

    match auth_service::find_user(&db, &user_id).await {
        Ok(Some(user)) => HttpResponse::Ok().json(json!({
            "success": true,
            "user": UserPublicInfo::from(user),
        })),
        Ok(None) => HttpResponse::NotFound().json(json!({
            "success": false,
            "error": "User not found"
        })),
        Err(e) => e.to_response(),
    }
}
