//! HTTP route groups.

pub mod chat;
pub mod documents;
pub mod health;

pub use chat::chat_routes;
pub use documents::document_routes;
pub use health::health_routes;
