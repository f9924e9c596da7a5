// Application state for HTTP handlers
use crate::application::auth_service::AuthService;
use crate::application::chart_service::ChartService;
use crate::application::device_service::DeviceService;
use crate::application::export_service::ExportService;
use crate::application::streaming_service::StreamingChartService;
use crate::infrastructure::session_store::SessionContext;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub device_service: DeviceService,
    pub chart_service: ChartService,
    pub streaming_service: StreamingChartService,
    pub export_service: ExportService,
}

impl AppState {
    pub fn session(&self) -> &SessionContext {
        self.auth_service.session()
    }
}
