pub mod admin_service;
pub mod auth_service;
pub mod barcode_service;
pub mod chat_service;
pub mod coaching_service;
pub mod email_service;
pub mod meal_service;
pub mod notification_service;
pub mod plan_service;
pub mod profile_service;
pub mod recipe_service;
