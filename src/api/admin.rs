use crate::services::auth_service::Claims;
use crate::{database::MongoDB, services::admin_service};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SetActiveRequest {
    pub active: bool,
}

fn admin_only(claims: &Claims) -> Option<HttpResponse> {
    if claims.is_admin() {
        None
    } else {
        Some(HttpResponse::Forbidden().json(json!({
            "success": false,
            "error": "Admin role required"
        })))
    }
}

pub async fn pending_coaches(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    if let Some(denied) = admin_only(&claims) {
        return denied;
    }
    log::info!("🛡️ GET /admin/coaches/pending - {}", claims.sub);

    match admin_service::pending_coaches(&db).await {
        Ok(coaches) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": coaches.len(),
            "coaches": coaches,
        })),
        Err(e) => e.to_response(),
    }
}

#[utoipa::path(
    post,
    path = "/admin/coaches/{nutritionist_id}/approve",
    tag = "Admin",
    params(("nutritionist_id" = String, Path, description = "Coach account id")),
    responses(
        (status = 200, description = "Coach approved"),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "Verification already resolved")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve_coach(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    if let Some(denied) = admin_only(&claims) {
        return denied;
    }
    let nutritionist_id = path.into_inner();
    log::info!("🛡️ POST /admin/coaches/{}/approve - {}", nutritionist_id, claims.sub);

    match admin_service::approve_coach(&db, &nutritionist_id).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(e) => {
            log::warn!("❌ Approve failed: {} - {}", nutritionist_id, e);
            e.to_response()
        }
    }
}

pub async fn reject_coach(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    if let Some(denied) = admin_only(&claims) {
        return denied;
    }
    let nutritionist_id = path.into_inner();
    log::info!("🛡️ POST /admin/coaches/{}/reject - {}", nutritionist_id, claims.sub);

    match admin_service::reject_coach(&db, &nutritionist_id).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(e) => {
            log::warn!("❌ Reject failed: {} - {}", nutritionist_id, e);
            e.to_response()
        }
    }
}

pub async fn set_account_active(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<SetActiveRequest>,
) -> HttpResponse {
    if let Some(denied) = admin_only(&claims) {
        return denied;
    }
    let account_id = path.into_inner();
    log::info!(
        "🛡️ POST /admin/accounts/{}/active ({}) - {}",
        account_id,
        request.active,
        claims.sub
    );

    match admin_service::set_account_active(&db, &account_id, request.active).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(e) => {
            log::warn!("❌ Set active failed: {} - {}", account_id, e);
            e.to_response()
        }
    }
}

pub async fn list_feedback(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    if let Some(denied) = admin_only(&claims) {
        return denied;
    }
    log::info!("🛡️ GET /admin/feedback - {}", claims.sub);

    match admin_service::list_feedback(&db).await {
        Ok(items) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": items.len(),
            "feedback": items,
        })),
        Err(e) => e.to_response(),
    }
}

pub async fn resolve_feedback(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    if let Some(denied) = admin_only(&claims) {
        return denied;
    }
    let feedback_id = path.into_inner();
    log::info!("🛡️ POST /admin/feedback/{}/resolve - {}", feedback_id, claims.sub);

    match admin_service::resolve_feedback(&db, &feedback_id).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(e) => {
            log::warn!("❌ Resolve feedback failed: {} - {}", feedback_id, e);
            e.to_response()
        }
    }
}
