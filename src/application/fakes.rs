// In-memory API doubles for service tests
use crate::application::air_quality_api::{
    AccountApi, DeviceApi, ExportApi, MetricsApi, SeriesQuery,
};
use crate::domain::device::Device;
use crate::domain::export::{ExportBlob, ExportedFile};
use crate::domain::sample::{MetricPage, MetricSample, PageInfo};
use crate::domain::user::{AuthResponse, Credentials, Registration, User};
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

type PageHandler = Box<dyn Fn(&SeriesQuery) -> ApiResult<MetricPage> + Send + Sync>;

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// `count` hourly samples starting `first_hour` hours after the base time
pub fn hourly(device: &str, first_hour: i64, count: i64) -> Vec<MetricSample> {
    (first_hour..first_hour + count)
        .map(|h| MetricSample::new(base_time() + TimeDelta::hours(h), Some(h as f64), device))
        .collect()
}

pub fn paged(samples: Vec<MetricSample>, page: u32, pages: u32) -> MetricPage {
    MetricPage::new(samples, Some(PageInfo { page, pages }))
}

pub struct FakeMetricsApi {
    handler: PageHandler,
    calls: Mutex<Vec<SeriesQuery>>,
    gate: Option<(String, Arc<Semaphore>)>,
}

impl FakeMetricsApi {
    pub fn new(
        handler: impl Fn(&SeriesQuery) -> ApiResult<MetricPage> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Requests for `metric` block until the semaphore hands out a permit
    pub fn gated(mut self, metric: &str, semaphore: Arc<Semaphore>) -> Self {
        self.gate = Some((metric.to_string(), semaphore));
        self
    }

    pub fn calls(&self) -> Vec<SeriesQuery> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls().len() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl MetricsApi for FakeMetricsApi {
    async fn fetch_metric_page(&self, query: &SeriesQuery) -> ApiResult<MetricPage> {
        self.calls.lock().unwrap().push(query.clone());
        if let Some((metric, semaphore)) = &self.gate {
            if &query.metric == metric {
                let _permit = semaphore.acquire().await.unwrap();
            }
        }
        (self.handler)(query)
    }
}

#[derive(Default)]
pub struct FakeDeviceApi {
    pub devices: Vec<Device>,
    pub fail: bool,
}

#[async_trait]
impl DeviceApi for FakeDeviceApi {
    async fn list_devices(&self) -> ApiResult<Vec<Device>> {
        if self.fail {
            return Err(ApiError::Status(500));
        }
        Ok(self.devices.clone())
    }
}

pub fn user(role: &str) -> User {
    User {
        id: 7,
        email: "ops@example.com".to_string(),
        username: Some("ops".to_string()),
        role: role.to_string(),
    }
}

#[derive(Default)]
pub struct FakeAccountApi {
    pub login_response: Option<AuthResponse>,
    pub current: Option<User>,
    pub refreshed_access: Option<String>,
    pub refresh_calls: Mutex<Vec<String>>,
}

#[async_trait]
impl AccountApi for FakeAccountApi {
    async fn login(&self, _credentials: &Credentials) -> ApiResult<AuthResponse> {
        self.login_response.clone().ok_or(ApiError::Status(401))
    }

    async fn register(&self, _registration: &Registration) -> ApiResult<AuthResponse> {
        Ok(self.login_response.clone().unwrap_or_default())
    }

    async fn current_user(&self) -> ApiResult<User> {
        self.current.clone().ok_or(ApiError::SessionExpired)
    }

    async fn refresh_token(&self, refresh: &str) -> ApiResult<String> {
        self.refresh_calls.lock().unwrap().push(refresh.to_string());
        self.refreshed_access.clone().ok_or(ApiError::Status(401))
    }
}

#[derive(Default)]
pub struct FakeExportApi {
    pub files: Vec<ExportedFile>,
}

#[async_trait]
impl ExportApi for FakeExportApi {
    async fn list_exports(&self) -> ApiResult<Vec<ExportedFile>> {
        Ok(self.files.clone())
    }

    async fn download_export(&self, id: i64) -> ApiResult<ExportBlob> {
        self.files
            .iter()
            .find(|f| f.id == id)
            .map(|f| ExportBlob {
                filename: Some(f.filename.clone()),
                content_type: "text/csv".to_string(),
                bytes: Bytes::from_static(b"timestamp,value\n"),
            })
            .ok_or(ApiError::Status(404))
    }
}
