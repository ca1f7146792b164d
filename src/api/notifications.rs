use crate::services::auth_service::Claims;
use crate::{database::MongoDB, services::notification_service};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SavePushTokenRequest {
    pub token: String,
}

pub async fn save_push_token(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<SavePushTokenRequest>,
) -> HttpResponse {
    log::info!("🔔 POST /api/notifications/token - {}", claims.sub);

    match notification_service::save_push_token(&db, &claims.sub, claims.is_coach(), &request.token)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(e) => {
            log::warn!("❌ Push token save failed: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}

/// Most recent notifications for the authenticated account, newest first.
pub async fn get_history(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    log::info!("🔔 GET /api/notifications - {}", claims.sub);

    match notification_service::get_history(&db, &claims.sub).await {
        Ok(notifications) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": notifications.len(),
            "notifications": notifications,
        })),
        Err(e) => e.to_response(),
    }
}
