use actix_web::{http::StatusCode, HttpResponse};
use std::fmt;

use crate::api::metrics;

/// Service-layer error, mapped to an HTTP status at the route boundary.
#[derive(Debug)]
pub enum AppError {
    /// 400 - malformed input (bad date, negative nutrients, ...)
    Validation(String),
    /// 401 - missing or invalid credentials/token
    Unauthorized(String),
    /// 403 - authenticated but not allowed (ownership mismatch, blocked coach)
    Forbidden(String),
    /// 404 - document does not exist
    NotFound(String),
    /// 409 - state conflict (duplicate request, already has a coach)
    Conflict(String),
    /// 500 - missing required configuration
    Config(String),
    /// 500 - MongoDB failure
    Database(String),
    /// 502 - external API failure (Spoonacular, OpenFoodFacts, Expo, email relay)
    Upstream(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Config(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// JSON body in the same shape every handler returns on failure.
    pub fn to_response(&self) -> HttpResponse {
        metrics::increment_error_count();
        HttpResponse::build(self.status()).json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }))
    }

    pub fn db(e: mongodb::error::Error) -> Self {
        AppError::Database(format!("Database error: {}", e))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Config(msg)
            | AppError::Database(msg)
            | AppError::Upstream(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Config("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::Upstream("x".into()).status(), StatusCode::BAD_GATEWAY);
    }
}
