//! HTTP request handlers.

pub mod cookies;
pub mod user_handler;

pub use user_handler::AppState;
