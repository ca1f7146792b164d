use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BiteWise API",
        version = "1.0.0",
        description = "Nutrition coaching backend. \n\n**Authentication:** All endpoints except /auth/*, /health and /metrics require a JWT Bearer token.\n\n**Features:**\n- Email/password auth for personal and coach accounts\n- Meal logging with daily totals and logging streaks\n- Coach marketplace, request/accept/select lifecycle and ratings\n- 1:1 coach-client messaging\n- Recipe search (Spoonacular) and barcode lookup (OpenFoodFacts)\n- Admin coach verification and feedback triage",
        contact(
            name = "BiteWise Team",
            email = "support@bitewise.app"
        )
    ),
    paths(
        // Auth
        crate::api::auth::register,
        crate::api::auth::login,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,

        // Profile & users
        crate::api::profile::update_profile,
        crate::api::users::get_user,

        // Experts & coaching
        crate::api::experts::list_experts,
        crate::api::coaching::send_request,
        crate::api::coaching::accept_request,
        crate::api::coaching::select_coach,
        crate::api::coaching::rate_coach,

        // Meals
        crate::api::meals::log_meal,
        crate::api::meals::get_daily,

        // Messaging
        crate::api::chats::send_message,

        // Feedback & integrations
        crate::api::feedback::submit_feedback,
        crate::api::recipes::search_recipes,
        crate::api::recipes::get_recipe,
        crate::api::products::get_product,

        // Admin
        crate::api::admin::approve_coach,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::AuthResponse,
            crate::services::auth_service::AccountInfo,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,

            // Profile
            crate::services::profile_service::UpdateProfileRequest,
            crate::models::user::UserPublicInfo,
            crate::models::user::NutritionPlan,
            crate::models::nutritionist::NutritionistPublicInfo,

            // Coaching
            crate::api::coaching::CoachTargetRequest,
            crate::api::coaching::RateCoachRequest,

            // Meals
            crate::services::meal_service::LogMealRequest,

            // Messaging & notifications
            crate::api::chats::SendMessageRequest,
            crate::api::notifications::SavePushTokenRequest,

            // Feedback & admin
            crate::api::feedback::SubmitFeedbackRequest,
            crate::api::admin::SetActiveRequest,

            // Integrations
            crate::services::recipe_service::RecipeSummary,
            crate::services::recipe_service::RecipeSearchResult,
            crate::services::recipe_service::RecipeDetail,
            crate::models::barcode_cache::ProductInfo,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and token refresh for personal and coach accounts."),
        (name = "Health", description = "Health check and metrics endpoints for monitoring."),
        (name = "Profile", description = "Own-profile reads and updates, including body metrics that drive the nutrition plan."),
        (name = "Users", description = "Public user projections."),
        (name = "Experts", description = "Verified coach marketplace listing."),
        (name = "Coaching", description = "Coach request lifecycle: request, accept/decline, select, end, block and rate."),
        (name = "Meals", description = "Meal logging, daily nutrition totals and logging streaks."),
        (name = "Messaging", description = "1:1 chats between a user and their coach."),
        (name = "Feedback", description = "User feedback submission."),
        (name = "Recipes", description = "Spoonacular recipe search and detail."),
        (name = "Products", description = "OpenFoodFacts barcode lookup with caching."),
        (name = "Admin", description = "Coach verification, account moderation and feedback triage."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
