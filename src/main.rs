// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use airq_dashboard::application::auth_service::AuthService;
use airq_dashboard::application::chart_service::ChartService;
use airq_dashboard::application::device_service::DeviceService;
use airq_dashboard::application::export_service::ExportService;
use airq_dashboard::application::streaming_service::StreamingChartService;
use airq_dashboard::infrastructure::config::load_dashboard_config;
use airq_dashboard::infrastructure::http_api::HttpAirQualityApi;
use airq_dashboard::infrastructure::navigator::TracingNavigator;
use airq_dashboard::infrastructure::session_store::{FileSessionStore, SessionContext};
use airq_dashboard::presentation::app_state::AppState;
use airq_dashboard::presentation::router::build_router;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config()?;

    // Session slot and API client (infrastructure layer)
    let session = SessionContext::new(
        Arc::new(FileSessionStore::open(config.session.path.clone())),
        Arc::new(TracingNavigator),
    );
    let api = Arc::new(HttpAirQualityApi::new(
        config.api.base_url.clone(),
        session.clone(),
        config.api.timeout(),
    )?);

    // Create services (application layer)
    let page_limit = config.api.page_limit;
    let auth_service = AuthService::new(api.clone(), session);
    let device_service = DeviceService::new(api.clone());
    let chart_service =
        ChartService::new(api.clone(), device_service.clone()).with_page_limit(page_limit);
    let streaming_service =
        StreamingChartService::new(api.clone(), device_service.clone(), page_limit);
    let export_service = ExportService::new(api.clone(), api.clone(), chart_service.clone());

    if let Some(user) = auth_service.restore().await {
        tracing::info!("Restored session for {}", user.email);
    }

    // Create application state
    let state = Arc::new(AppState {
        auth_service,
        device_service,
        chart_service,
        streaming_service,
        export_service,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting airq-dashboard on {} (API {})", addr, config.api.base_url);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
