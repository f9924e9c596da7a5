// Remote air-quality REST API client
use crate::application::air_quality_api::{
    AccountApi, DeviceApi, ExportApi, MetricsApi, SeriesQuery,
};
use crate::domain::device::Device;
use crate::domain::export::{ExportBlob, ExportedFile};
use crate::domain::sample::MetricPage;
use crate::domain::user::{AuthResponse, Credentials, Registration, User};
use crate::error::{ApiError, ApiResult};
use crate::infrastructure::auth_interceptor::AuthInterceptor;
use crate::infrastructure::response_mapper::{devices_from_json, metric_page_from_json};
use crate::infrastructure::session_store::SessionContext;
use async_trait::async_trait;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;

#[derive(Clone)]
pub struct HttpAirQualityApi {
    base_url: String,
    client: Client,
    interceptor: AuthInterceptor,
}

impl HttpAirQualityApi {
    pub fn new(
        base_url: impl Into<String>,
        session: SessionContext,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            interceptor: AuthInterceptor::new(session),
        })
    }

    pub fn session(&self) -> &SessionContext {
        self.interceptor.session()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        let url = self.endpoint(path);
        tracing::debug!("API request: GET {}", url);
        let response = self
            .interceptor
            .send(self.client.get(&url).query(query))
            .await?;
        read_json(response).await
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let url = self.endpoint(path);
        tracing::debug!("API request: POST {}", url);
        let response = self.interceptor.send(self.client.post(&url).json(body)).await?;
        read_json(response).await
    }
}

/// Decode a JSON body, telling HTML error pages apart from other non-JSON bodies
async fn read_json(response: Response) -> ApiResult<Value> {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);

    if is_json {
        return Ok(response.json::<Value>().await?);
    }

    let text = response.text().await?;
    let trimmed = text.trim_start();
    if trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html") {
        tracing::error!(
            "HTML response received: {}",
            trimmed.chars().take(500).collect::<String>()
        );
        return Err(ApiError::HtmlResponse);
    }
    Err(ApiError::NonJson)
}

/// `attachment; filename="VOC_20240203.csv"` -> `VOC_20240203.csv`
fn attachment_filename(disposition: &str) -> Option<String> {
    disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

#[async_trait]
impl MetricsApi for HttpAirQualityApi {
    async fn fetch_metric_page(&self, query: &SeriesQuery) -> ApiResult<MetricPage> {
        let path = format!(
            "air-quality/{}/{}/",
            urlencoding::encode(&query.device_id),
            urlencoding::encode(&query.metric)
        );
        let params = [
            ("start_time", query.window.start_param()),
            ("end_time", query.window.end_param()),
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
        ];

        let body = self.get_json(&path, &params).await?;
        metric_page_from_json(body, &query.device_id, &query.metric)
    }
}

#[async_trait]
impl DeviceApi for HttpAirQualityApi {
    async fn list_devices(&self) -> ApiResult<Vec<Device>> {
        let body = self.get_json("devices/", &[]).await?;
        devices_from_json(body)
    }
}

#[async_trait]
impl AccountApi for HttpAirQualityApi {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
        let body = self.post_json("login/", credentials).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn register(&self, registration: &Registration) -> ApiResult<AuthResponse> {
        let body = self.post_json("register/", registration).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn current_user(&self) -> ApiResult<User> {
        let body = self.get_json("protected/", &[]).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn refresh_token(&self, refresh: &str) -> ApiResult<String> {
        let body = self
            .post_json("token/refresh/", &json!({ "refresh": refresh }))
            .await?;
        body.get("access")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::Decode("token refresh response has no access token".to_string())
            })
    }
}

#[async_trait]
impl ExportApi for HttpAirQualityApi {
    async fn list_exports(&self) -> ApiResult<Vec<ExportedFile>> {
        let body = self.get_json("exported-files/", &[]).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn download_export(&self, id: i64) -> ApiResult<ExportBlob> {
        let url = self.endpoint(&format!("download-export/{}/", id));
        tracing::debug!("API request: GET {}", url);
        let response = self.interceptor.send(self.client.get(&url)).await?;

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let filename = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_filename);

        Ok(ExportBlob {
            filename,
            content_type,
            bytes: response.bytes().await?,
        })
    }
}
