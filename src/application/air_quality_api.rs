// Remote API traits, split by concern so services depend only on what they call
use crate::domain::device::Device;
use crate::domain::export::{ExportBlob, ExportedFile};
use crate::domain::sample::MetricPage;
use crate::domain::time_window::TimeWindow;
use crate::domain::user::{AuthResponse, Credentials, Registration, User};
use crate::error::ApiResult;
use async_trait::async_trait;

/// Rows requested per page from the metrics endpoint
pub const DEFAULT_PAGE_LIMIT: u32 = 500;

/// One page request against `air-quality/{device}/{metric}/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
    pub device_id: String,
    pub metric: String,
    pub window: TimeWindow,
    pub page: u32,
    pub limit: u32,
}

#[async_trait]
pub trait MetricsApi: Send + Sync {
    /// Fetch one page of a device's series for a metric
    async fn fetch_metric_page(&self, query: &SeriesQuery) -> ApiResult<MetricPage>;
}

#[async_trait]
pub trait DeviceApi: Send + Sync {
    async fn list_devices(&self) -> ApiResult<Vec<Device>>;
}

#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthResponse>;

    async fn register(&self, registration: &Registration) -> ApiResult<AuthResponse>;

    /// The user behind the stored access token
    async fn current_user(&self) -> ApiResult<User>;

    /// Exchange a refresh token for a new access token
    async fn refresh_token(&self, refresh: &str) -> ApiResult<String>;
}

#[async_trait]
pub trait ExportApi: Send + Sync {
    async fn list_exports(&self) -> ApiResult<Vec<ExportedFile>>;

    async fn download_export(&self, id: i64) -> ApiResult<ExportBlob>;
}
