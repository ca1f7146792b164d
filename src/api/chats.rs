use crate::services::auth_service::Claims;
use crate::{database::MongoDB, services::chat_service};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SendMessageRequest {
    /// Account id of the other participant
    pub to: String,
    pub text: String,
}

#[utoipa::path(
    post,
    path = "/messages",
    tag = "Messaging",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent"),
        (status = 400, description = "Empty or oversized text"),
        (status = 404, description = "Recipient not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_message(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<SendMessageRequest>,
) -> HttpResponse {
    log::info!("💬 POST /messages - {} -> {}", claims.sub, request.to);

    match chat_service::send_message(&db, &claims.sub, claims.is_coach(), &request.to, &request.text)
        .await
    {
        Ok(message) => HttpResponse::Created().json(json!({ "success": true, "message": message })),
        Err(e) => {
            log::warn!("❌ Send message failed: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}

pub async fn get_chats(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    log::info!("💬 GET /messages/chats - {}", claims.sub);

    match chat_service::get_chats(&db, &claims.sub, claims.is_coach()).await {
        Ok(chats) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": chats.len(),
            "chats": chats,
        })),
        Err(e) => e.to_response(),
    }
}

pub async fn get_messages(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    let chat_id = path.into_inner();
    log::info!("💬 GET /messages/{} - {}", chat_id, claims.sub);

    match chat_service::get_messages(&db, &chat_id, &claims.sub).await {
        Ok(messages) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": messages.len(),
            "messages": messages,
        })),
        Err(e) => {
            log::warn!("❌ Get messages failed: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}

pub async fn mark_read(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    let chat_id = path.into_inner();
    log::info!("💬 POST /messages/{}/read - {}", chat_id, claims.sub);

    match chat_service::mark_read(&db, &chat_id, &claims.sub).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(e) => e.to_response(),
    }
}
