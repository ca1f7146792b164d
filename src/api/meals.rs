use crate::services::auth_service::Claims;
use crate::services::meal_service::LogMealRequest;
use crate::{database::MongoDB, services::meal_service};
use actix_web::{web, HttpResponse};
use serde_json::json;

// Meal logs and streaks belong to personal accounts; a coach token would
// create consumption docs under a nutritionist id.
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
    path = "/meals",
    tag = "Meals",
    request_body = LogMealRequest,
    responses(
        (status = 201, description = "Meal logged, streak updated"),
        (status = 400, description = "Bad date or negative nutrients")
    ),
    security(("bearer_auth" = []))
)]
pub async fn log_meal(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<LogMealRequest>,
) -> HttpResponse {
    log::info!("🍽️ POST /meals - {} ({} on {})", claims.sub, request.name, request.date);

    if let Some(forbidden) = user_only(&claims) {
        return forbidden;
    }

    let entry = match meal_service::log_meal(&db, &claims.sub, &request).await {
        Ok(entry) => entry,
        Err(e) => {
            log::warn!("❌ Meal log failed: {} - {}", claims.sub, e);
            return e.to_response();
        }
    };

    // The meal is already persisted, a streak failure must not lose it
    match meal_service::update_streak(&db, &claims.sub, &request.date).await {
        Ok(streak) => HttpResponse::Created().json(json!({
            "success": true,
            "meal": entry,
            "streak": streak,
        })),
        Err(e) => {
            log::error!("❌ Streak update failed after meal log: {} - {}", claims.sub, e);
            HttpResponse::Created().json(json!({
                "success": true,
                "meal": entry,
                "streak": null,
            }))
        }
    }
}

#[utoipa::path(
    get,
    path = "/meals/{date}",
    tag = "Meals",
    params(("date" = String, Path, description = "Calendar day, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Daily consumption with running totals"),
        (status = 404, description = "Nothing logged that day")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_daily(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    let date = path.into_inner();
    log::info!("🍽️ GET /meals/{} - {}", date, claims.sub);

    if let Some(forbidden) = user_only(&claims) {
        return forbidden;
    }

    match meal_service::get_daily_consumption(&db, &claims.sub, &date).await {
        Ok(day) => HttpResponse::Ok().json(json!({ "success": true, "day": day })),
        Err(e) => e.to_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_with_roles(roles: Vec<String>) -> Claims {
        Claims {
            sub: "account-1".to_string(),
            email: "account@test.local".to_string(),
            name: None,
            roles,
            is_active: true,
            iat: 0,
            exp: 0,
            jti: "jti-1".to_string(),
            aud: "bitewise-app".to_string(),
            iss: "bitewise-service".to_string(),
        }
    }

    #[test]
    fn test_meal_routes_reject_coach_accounts() {
        let coach = claims_with_roles(vec!["nutritionist".to_string()]);
        let rejection = user_only(&coach).expect("coach must be rejected");
        assert_eq!(rejection.status(), 403);

        let user = claims_with_roles(vec!["user".to_string()]);
        assert!(user_only(&user).is_none());
    }
}
