// Presentation layer - HTTP routes for the dashboard frontend
pub mod app_state;
pub mod error_response;
pub mod handlers;
pub mod router;
