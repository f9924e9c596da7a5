// Application layer - Use cases over the remote air-quality API
pub mod air_quality_api;
pub mod auth_service;
pub mod chart_service;
pub mod device_service;
pub mod export_service;
pub mod multi_device_session;
pub mod series_session;
pub mod streaming_service;

#[cfg(test)]
mod fakes;
