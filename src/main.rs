mod api;
mod database;
mod jobs;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    if env::var("JWT_SECRET").is_err() {
        log::warn!("⚠️  JWT_SECRET not set, using insecure default (dev only)");
    }
    if env::var("SPOONACULAR_API_KEY").is_err() {
        log::warn!("⚠️  SPOONACULAR_API_KEY not set, recipe endpoints will return 500");
    }

    log::info!("🚀 Starting BiteWise Service...");
    log::info!("📊 Database: {}", database_url);

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    log::info!("✅ MongoDB connected successfully");

    let db_data = web::Data::new(db.clone());

    // 🌱 Seed default motivational messages
    seeds::motivational_messages_seed::seed_default_messages(&db).await;

    // 📅 Start background jobs
    log::info!("📅 Starting background jobs...");
    jobs::motivation_scheduler::start_motivation_scheduler(db.clone()).await;
    jobs::cleanup::start_cleanup_job(db.clone()).await;
    log::info!("✅ Background jobs started");

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        // Mobile clients send no Origin header; permissive CORS only matters
        // for the Expo web build in development.
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            // Auth endpoints (public)
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(api::auth::register))
                    .route("/login", web::post().to(api::auth::login))
                    .route("/refresh", web::post().to(api::auth::refresh_token)),
            )
            // Own profile
            .service(
                web::scope("/profile")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("", web::get().to(api::profile::get_profile))
                    .route("", web::put().to(api::profile::update_profile)),
            )
            // Public user projections
            .service(
                web::scope("/user")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/{user_id}", web::get().to(api::users::get_user)),
            )
            // Coach marketplace
            .service(
                web::scope("/expert")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("", web::get().to(api::experts::list_experts))
                    .route("/{nutritionist_id}", web::get().to(api::experts::get_expert)),
            )
            // Coaching lifecycle
            .service(
                web::scope("/coaching")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/request", web::post().to(api::coaching::send_request))
                    .route("/requests", web::get().to(api::coaching::get_my_requests))
                    .route("/incoming", web::get().to(api::coaching::get_incoming_requests))
                    .route(
                        "/requests/{request_id}/accept",
                        web::post().to(api::coaching::accept_request),
                    )
                    .route(
                        "/requests/{request_id}/decline",
                        web::post().to(api::coaching::decline_request),
                    )
                    .route("/select", web::post().to(api::coaching::select_coach))
                    .route("/end", web::post().to(api::coaching::end_relationship))
                    .route("/block", web::post().to(api::coaching::block_coach))
                    .route("/rate", web::post().to(api::coaching::rate_coach))
                    .route("/clients", web::get().to(api::coaching::get_clients))
                    .route(
                        "/clients/{user_id}/end",
                        web::post().to(api::coaching::coach_end_relationship),
                    ),
            )
            // Meal logging (the app posts to /logMeal, reads via /meals/{date})
            .service(
                web::resource("/logMeal")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route(web::post().to(api::meals::log_meal)),
            )
            .service(
                web::scope("/meals")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("", web::post().to(api::meals::log_meal))
                    .route("/{date}", web::get().to(api::meals::get_daily)),
            )
            // Messaging
            .service(
                web::scope("/messages")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("", web::post().to(api::chats::send_message))
                    .route("/chats", web::get().to(api::chats::get_chats))
                    .route("/{chat_id}/read", web::post().to(api::chats::mark_read))
                    // catch-all, must stay last
                    .route("/{chat_id}", web::get().to(api::chats::get_messages)),
            )
            // Recipes (Spoonacular)
            .service(
                web::scope("/recipes")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/search", web::get().to(api::recipes::search_recipes))
                    .route("/{recipe_id}", web::get().to(api::recipes::get_recipe)),
            )
            // Products, notifications and feedback
            .service(
                web::scope("/api")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/products/{barcode}", web::get().to(api::products::get_product))
                    .route("/notifications", web::get().to(api::notifications::get_history))
                    .route(
                        "/notifications/token",
                        web::post().to(api::notifications::save_push_token),
                    )
                    .route("/feedback", web::post().to(api::feedback::submit_feedback)),
            )
            // Admin
            .service(
                web::scope("/admin")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/coaches/pending", web::get().to(api::admin::pending_coaches))
                    .route(
                        "/coaches/{nutritionist_id}/approve",
                        web::post().to(api::admin::approve_coach),
                    )
                    .route(
                        "/coaches/{nutritionist_id}/reject",
                        web::post().to(api::admin::reject_coach),
                    )
                    .route(
                        "/accounts/{account_id}/active",
                        web::post().to(api::admin::set_account_active),
                    )
                    .route("/feedback", web::get().to(api::admin::list_feedback))
                    .route(
                        "/feedback/{feedback_id}/resolve",
                        web::post().to(api::admin::resolve_feedback),
                    ),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
