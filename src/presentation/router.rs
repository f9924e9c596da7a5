// Route table for the dashboard backend
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    chart, current_user, device_series, download_export, export_chart_csv, health_check,
    list_devices, list_exports, login, logout, map_locations, refresh, register, stream_chart,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(current_user))
        .route("/devices", get(list_devices))
        .route("/map", get(map_locations))
        .route("/series/:device/:metric", get(device_series))
        .route("/charts/:metric", get(chart))
        .route("/charts/:metric/stream", get(stream_chart))
        .route("/charts/:metric/export.csv", get(export_chart_csv))
        .route("/exports", get(list_exports))
        .route("/exports/:id/download", get(download_export))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
