use crate::models::UserPublicInfo;
use crate::services::auth_service::Claims;
use crate::{database::MongoDB, services::coaching_service};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CoachTargetRequest {
    pub nutritionist_id: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RateCoachRequest {
    pub nutritionist_id: String,
    pub stars: i64,
    pub comment: Option<String>,
}

fn coach_only(claims: &Claims) -> Option<HttpResponse> {
    if claims.is_coach() {
        None
    } else {
        Some(HttpResponse::Forbidden().json(json!({
            "success": false,
            "error": "Coach account required"
        })))
    }
}

fn user_only(claims: &Claims) -> Option<HttpResponse> {
    if claims.is_coach() {
        Some(HttpResponse::Forbidden().json(json!({
            "success": false,
            "error": "Personal account required"
        })))
    } else {
        None
    }
}

#[utoipa::path(
    post,
    path = "/coaching/request",
    tag = "Coaching",
    request_body = CoachTargetRequest,
    responses(
        (status = 201, description = "Request sent"),
        (status = 403, description = "Coach blocked or not accepting clients"),
        (status = 409, description = "Duplicate request or user already coached")
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_request(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<CoachTargetRequest>,
) -> HttpResponse {
    if let Some(denied) = user_only(&claims) {
        return denied;
    }
    log::info!("🤝 POST /coaching/request - {} -> {}", claims.sub, request.nutritionist_id);

    match coaching_service::send_request(&db, &claims.sub, &request.nutritionist_id).await {
        Ok(created) => HttpResponse::Created().json(json!({ "success": true, "request": created })),
        Err(e) => {
            log::warn!("❌ Coach request failed: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}

pub async fn get_my_requests(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    if let Some(denied) = user_only(&claims) {
        return denied;
    }
    log::info!("🤝 GET /coaching/requests - {}", claims.sub);

    match coaching_service::get_user_requests(&db, &claims.sub).await {
        Ok(requests) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": requests.len(),
            "requests": requests,
        })),
        Err(e) => e.to_response(),
    }
}

/// Pending requests addressed to the authenticated coach.
pub async fn get_incoming_requests(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    if let Some(denied) = coach_only(&claims) {
        return denied;
    }
    log::info!("🤝 GET /coaching/incoming - {}", claims.sub);

    match coaching_service::get_coach_requests(&db, &claims.sub).await {
        Ok(requests) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": requests.len(),
            "requests": requests,
        })),
        Err(e) => e.to_response(),
    }
}

#[utoipa::path(
    post,
    path = "/coaching/requests/{request_id}/accept",
    tag = "Coaching",
    params(("request_id" = String, Path, description = "Coach request id")),
    responses(
        (status = 200, description = "Request accepted"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request no longer pending")
    ),
    security(("bearer_auth" = []))
)]
pub async fn accept_request(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    if let Some(denied) = coach_only(&claims) {
        return denied;
    }
    let request_id = path.into_inner();
    log::info!("✅ POST /coaching/requests/{}/accept - {}", request_id, claims.sub);

    match coaching_service::accept_request(&db, &claims.sub, &request_id).await {
        Ok(updated) => HttpResponse::Ok().json(json!({ "success": true, "request": updated })),
        Err(e) => {
            log::warn!("❌ Accept failed: {} - {}", request_id, e);
            e.to_response()
        }
    }
}

pub async fn decline_request(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    if let Some(denied) = coach_only(&claims) {
        return denied;
    }
    let request_id = path.into_inner();
    log::info!("🚫 POST /coaching/requests/{}/decline - {}", request_id, claims.sub);

    match coaching_service::decline_request(&db, &claims.sub, &request_id).await {
        Ok(updated) => HttpResponse::Ok().json(json!({ "success": true, "request": updated })),
        Err(e) => {
            log::warn!("❌ Decline failed: {} - {}", request_id, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/coaching/select",
    tag = "Coaching",
    request_body = CoachTargetRequest,
    responses(
        (status = 200, description = "Coach selected"),
        (status = 409, description = "No accepted request or user already coached")
    ),
    security(("bearer_auth" = []))
)]
pub async fn select_coach(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<CoachTargetRequest>,
) -> HttpResponse {
    if let Some(denied) = user_only(&claims) {
        return denied;
    }
    log::info!("🎯 POST /coaching/select - {} -> {}", claims.sub, request.nutritionist_id);

    match coaching_service::select_coach(&db, &claims.sub, &request.nutritionist_id).await {
        Ok(updated) => HttpResponse::Ok().json(json!({ "success": true, "request": updated })),
        Err(e) => {
            log::warn!("❌ Select failed: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}

pub async fn end_relationship(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    if let Some(denied) = user_only(&claims) {
        return denied;
    }
    log::info!("👋 POST /coaching/end - {}", claims.sub);

    match coaching_service::end_relationship(&db, &claims.sub).await {
        Ok(updated) => HttpResponse::Ok().json(json!({ "success": true, "request": updated })),
        Err(e) => {
            log::warn!("❌ End failed: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}

/// Coach side of ending, only valid against one of their own clients.
pub async fn coach_end_relationship(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    if let Some(denied) = coach_only(&claims) {
        return denied;
    }
    let user_id = path.into_inner();
    log::info!("👋 POST /coaching/clients/{}/end - {}", user_id, claims.sub);

    match coaching_service::coach_end_relationship(&db, &claims.sub, &user_id).await {
        Ok(updated) => HttpResponse::Ok().json(json!({ "success": true, "request": updated })),
        Err(e) => {
            log::warn!("❌ Coach end failed: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}

pub async fn block_coach(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    if let Some(denied) = user_only(&claims) {
        return denied;
    }
    log::info!("⛔ POST /coaching/block - {}", claims.sub);

    match coaching_service::block_coach(&db, &claims.sub).await {
        Ok(updated) => HttpResponse::Ok().json(json!({ "success": true, "request": updated })),
        Err(e) => {
            log::warn!("❌ Block failed: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/coaching/rate",
    tag = "Coaching",
    request_body = RateCoachRequest,
    responses(
        (status = 200, description = "Rating recorded"),
        (status = 400, description = "Stars out of range"),
        (status = 409, description = "No rateable relationship with this coach")
    ),
    security(("bearer_auth" = []))
)]
pub async fn rate_coach(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<RateCoachRequest>,
) -> HttpResponse {
    if let Some(denied) = user_only(&claims) {
        return denied;
    }
    log::info!(
        "⭐ POST /coaching/rate - {} -> {} ({} stars)",
        claims.sub,
        request.nutritionist_id,
        request.stars
    );

    match coaching_service::rate_coach(
        &db,
        &claims.sub,
        &request.nutritionist_id,
        request.stars,
        request.comment.clone(),
    )
    .await
    {
        Ok(result) => HttpResponse::Ok().json(json!({ "success": true, "rating": result })),
        Err(e) => {
            log::warn!("❌ Rating failed: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}

pub async fn get_clients(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    if let Some(denied) = coach_only(&claims) {
        return denied;
    }
    log::info!("👥 GET /coaching/clients - {}", claims.sub);

    match coaching_service::get_coach_clients(&db, &claims.sub).await {
        Ok(clients) => {
            let clients: Vec<UserPublicInfo> =
                clients.into_iter().map(UserPublicInfo::from).collect();
            HttpResponse::Ok().json(json!({
                "success": true,
                "count": clients.len(),
                "clients": clients,
            }))
        }
        Err(e) => e.to_response(),
    }
}
