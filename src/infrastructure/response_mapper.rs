// Mapper from raw API JSON to domain models
use crate::domain::device::{DEFAULT_LATITUDE, DEFAULT_LONGITUDE, Device};
use crate::domain::sample::{MetricPage, MetricSample, PageInfo};
use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Accepts a bare array or `{ "data": [...], "pagination": { "page", "pages" } }`
pub fn metric_page_from_json(body: Value, device_id: &str, metric: &str) -> ApiResult<MetricPage> {
    let (rows, pagination) = match body {
        Value::Array(rows) => (rows, None),
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(rows)) => (rows, envelope.get("pagination").and_then(page_info)),
            _ => return Err(ApiError::UnexpectedFormat),
        },
        _ => return Err(ApiError::UnexpectedFormat),
    };

    let total = rows.len();
    let samples: Vec<MetricSample> = rows
        .iter()
        .filter_map(|row| sample_from_row(row, device_id, metric))
        .collect();

    if samples.len() < total {
        tracing::debug!(
            "Dropped {} rows without a usable timestamp for {}/{}",
            total - samples.len(),
            device_id,
            metric
        );
    }

    Ok(MetricPage::new(samples, pagination))
}

fn page_info(value: &Value) -> Option<PageInfo> {
    let page = value.get("page")?.as_u64()?;
    let pages = value.get("pages")?.as_u64()?;
    Some(PageInfo {
        page: u32::try_from(page).ok()?,
        pages: u32::try_from(pages).ok()?,
    })
}

fn sample_from_row(row: &Value, device_id: &str, metric: &str) -> Option<MetricSample> {
    let row = row.as_object()?;
    let timestamp =
        first_present(row, &["timestamp", "ReportedTime-UTC"]).and_then(timestamp_value)?;
    let value = first_present(row, &["value", metric]).and_then(numeric_value);
    let source_id = first_present(row, &["site_name", "SiteName"])
        .and_then(Value::as_str)
        .unwrap_or(device_id);

    Some(MetricSample::new(timestamp, value, source_id))
}

fn first_present<'a>(row: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find(|v| !v.is_null())
}

fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// RFC 3339, or an offset-less `YYYY-MM-DD HH:MM:SS` taken as UTC
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Numbers and numeric strings; `"NaN"` parses to NaN and is filtered later
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn devices_from_json(body: Value) -> ApiResult<Vec<Device>> {
    let Value::Array(rows) = body else {
        return Err(ApiError::UnexpectedFormat);
    };
    Ok(rows.iter().filter_map(device_from_value).collect())
}

fn device_from_value(value: &Value) -> Option<Device> {
    let row = value.as_object()?;
    let site_name = row.get("SiteName").and_then(Value::as_str);

    let id = match row.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => site_name?.to_string(),
    };
    let name = row
        .get("name")
        .and_then(Value::as_str)
        .or(site_name)
        .unwrap_or(&id)
        .to_string();
    let device_type = row
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Device::infer_type(site_name.unwrap_or_default()).to_string());

    Some(Device {
        display_name: row
            .get("display_name")
            .and_then(Value::as_str)
            .map(str::to_string),
        latitude: row
            .get("latitude")
            .and_then(numeric_value)
            .unwrap_or(DEFAULT_LATITUDE),
        longitude: row
            .get("longitude")
            .and_then(numeric_value)
            .unwrap_or(DEFAULT_LONGITUDE),
        id,
        name,
        device_type,
    })
}
