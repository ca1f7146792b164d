pub mod admin;
pub mod auth;
pub mod chats;
pub mod coaching;
pub mod experts;
pub mod feedback;
pub mod health;
pub mod meals;
pub mod metrics;
pub mod notifications;
pub mod products;
pub mod profile;
pub mod recipes;
pub mod swagger;
pub mod users;
