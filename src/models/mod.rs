pub mod barcode_cache;
pub mod chat;
pub mod coach_request;
pub mod consumption;
pub mod feedback;
pub mod notification;
pub mod nutritionist;
pub mod user;

pub use barcode_cache::*;
pub use chat::*;
pub use coach_request::*;
pub use consumption::*;
pub use feedback::*;
pub use notification::*;
pub use nutritionist::*;
pub use user::*;
