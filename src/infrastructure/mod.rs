// Infrastructure layer - External dependencies and adapters
pub mod auth_interceptor;
pub mod config;
pub mod csv_export;
pub mod http_api;
pub mod navigator;
pub mod ndjson_stream;
pub mod response_mapper;
pub mod session_store;
