// HTTP request handlers
use crate::application::multi_device_session::MultiDeviceSelection;
use crate::application::series_session::{SeriesSelection, SeriesSession, SeriesState};
use crate::domain::chart::ChartProjection;
use crate::domain::device::{Device, MapLocation};
use crate::domain::export::ExportedFile;
use crate::domain::time_window::TimeRange;
use crate::domain::user::{Credentials, Registration, User};
use crate::error::{ApiError, ApiResult};
use crate::infrastructure::ndjson_stream::stream_from_receiver;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cap on pages a single `/series` request will walk through
const MAX_SERIES_PAGES: u32 = 20;

#[derive(Deserialize)]
pub struct SeriesParams {
    pub range: Option<String>,
    pub pages: Option<u32>,
}

#[derive(Deserialize)]
pub struct ChartParams {
    pub devices: Option<String>,
    pub range: Option<String>,
}

impl ChartParams {
    fn selection(&self, metric: String) -> MultiDeviceSelection {
        let device_ids = self
            .devices
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|id| id.trim().to_string());
        MultiDeviceSelection::new(device_ids, metric, range_param(self.range.as_deref()))
    }
}

#[derive(Serialize)]
pub struct SeriesResponse {
    pub device_id: String,
    pub metric: String,
    pub range: TimeRange,
    pub start_time: String,
    pub end_time: String,
    #[serde(flatten)]
    pub state: SeriesState,
}

fn range_param(token: Option<&str>) -> TimeRange {
    token.map(TimeRange::from_token).unwrap_or_default()
}

/// Protected routes need a stored access token
fn require_session(state: &AppState) -> ApiResult<()> {
    if state.session().is_signed_in() {
        Ok(())
    } else {
        Err(ApiError::SessionExpired)
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> ApiResult<Json<User>> {
    state.auth_service.login(&credentials).await.map(Json)
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(registration): Json<Registration>,
) -> ApiResult<(StatusCode, Json<Option<User>>)> {
    let user = state.auth_service.sign_up(&registration).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn logout(State(state): State<Arc<AppState>>) -> StatusCode {
    state.auth_service.logout();
    StatusCode::NO_CONTENT
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state.auth_service.refresh_access_token().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_user(State(state): State<Arc<AppState>>) -> ApiResult<Json<User>> {
    require_session(&state)?;
    state.auth_service.current_user().await.map(Json)
}

pub async fn list_devices(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Device>>> {
    require_session(&state)?;
    state.device_service.devices().await.map(Json)
}

pub async fn map_locations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<MapLocation>>> {
    require_session(&state)?;
    state.device_service.map_locations().await.map(Json)
}

/// Single-device series, walking `pages` pages of the paginated endpoint
pub async fn device_series(
    Path((device_id, metric)): Path<(String, String)>,
    Query(params): Query<SeriesParams>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SeriesResponse>> {
    require_session(&state)?;

    let range = range_param(params.range.as_deref());
    let pages = params.pages.unwrap_or(1).clamp(1, MAX_SERIES_PAGES);
    let session = SeriesSession::new(
        state.chart_service.metrics_api(),
        SeriesSelection::new(device_id.clone(), metric.clone(), range),
    )
    .with_page_limit(state.chart_service.page_limit());

    session.start().await;
    for _ in 1..pages {
        if !session.load_more().await {
            break;
        }
    }

    // A 401 mid-walk has already purged the tokens
    require_session(&state)?;

    let window = session.window().await;
    Ok(Json(SeriesResponse {
        device_id,
        metric,
        range,
        start_time: window.start_param(),
        end_time: window.end_param(),
        state: session.snapshot().await,
    }))
}

pub async fn chart(
    Path(metric): Path<String>,
    Query(params): Query<ChartParams>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ChartProjection>> {
    require_session(&state)?;
    let projection = state.chart_service.chart(params.selection(metric)).await;
    require_session(&state)?;
    Ok(Json(projection))
}

/// Stream a chart progressively (skeleton, per-device series, completion)
pub async fn stream_chart(
    Path(metric): Path<String>,
    Query(params): Query<ChartParams>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response> {
    require_session(&state)?;
    let rx = state
        .streaming_service
        .stream_chart(params.selection(metric))
        .await;
    Ok(stream_from_receiver(rx).into_response())
}

pub async fn export_chart_csv(
    Path(metric): Path<String>,
    Query(params): Query<ChartParams>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response> {
    require_session(&state)?;
    let export = state
        .export_service
        .export_chart_csv(params.selection(metric))
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, attachment(&export.filename)),
        ],
        export.bytes,
    )
        .into_response())
}

pub async fn list_exports(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ExportedFile>>> {
    require_session(&state)?;
    state.export_service.list_exports().await.map(Json)
}

pub async fn download_export(
    Path(id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response> {
    require_session(&state)?;
    let blob = state.export_service.download(id).await?;
    let filename = blob.filename.unwrap_or_else(|| format!("export_{}.csv", id));

    Ok((
        [
            (header::CONTENT_TYPE, blob.content_type),
            (header::CONTENT_DISPOSITION, attachment(&filename)),
        ],
        blob.bytes,
    )
        .into_response())
}

fn attachment(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", filename.replace('"', ""))
}
