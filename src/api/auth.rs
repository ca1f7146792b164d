use crate::services::auth_service::{AuthResponse, LoginRequest, RegisterRequest};
use crate::{database::MongoDB, services::auth_service};
use actix_web::{web, HttpResponse};

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    db: web::Data<MongoDB>,
    request: web::Json<RegisterRequest>,
) -> HttpResponse {
    let account_type = request.account_type.as_deref().unwrap_or("personal");
    log::info!("📝 POST /auth/register - email: {}, type: {}", request.email, account_type);

    match auth_service::register(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Registration successful: {}", request.email);
            HttpResponse::Created().json(response)
        }
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", request.email, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account disabled")
    )
)]
pub async fn login(db: web::Data<MongoDB>, request: web::Json<LoginRequest>) -> HttpResponse {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    match auth_service::login(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            e.to_response()
        }
    }
}

pub async fn refresh_token(
    db: web::Data<MongoDB>,
    request: web::Json<auth_service::RefreshTokenRequest>,
) -> HttpResponse {
    log::info!("🔄 POST /auth/refresh");

    match auth_service::refresh_token(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Token refreshed");
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Token refresh failed: {}", e);
            e.to_response()
        }
    }
}
