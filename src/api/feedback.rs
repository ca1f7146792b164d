use crate::services::auth_service::Claims;
use crate::{database::MongoDB, services::admin_service};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmitFeedbackRequest {
    pub subject: String,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/feedback",
    tag = "Feedback",
    request_body = SubmitFeedbackRequest,
    responses(
        (status = 201, description = "Feedback recorded"),
        (status = 400, description = "Missing subject or message")
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit_feedback(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<SubmitFeedbackRequest>,
) -> HttpResponse {
    log::info!("📝 POST /api/feedback - {}", claims.sub);

    match admin_service::submit_feedback(&db, &claims.sub, &request.subject, &request.message).await
    {
        Ok(feedback) => HttpResponse::Created().json(json!({ "success": true, "feedback": feedback })),
        Err(e) => {
            log::warn!("❌ Feedback submit failed: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}
