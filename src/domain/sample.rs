// Metric sample domain models
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Values at or beyond this magnitude are treated as sensor garbage and never plotted
pub const MAX_PLOTTABLE_MAGNITUDE: f64 = 1e10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
    pub source_id: String,
}

impl MetricSample {
    pub fn new(timestamp: DateTime<Utc>, value: Option<f64>, source_id: impl Into<String>) -> Self {
        Self {
            timestamp,
            value,
            source_id: source_id.into(),
        }
    }

    /// The value if it can go on a chart: present, finite and below the magnitude cap
    pub fn plottable_value(&self) -> Option<f64> {
        self.value
            .filter(|v| v.is_finite() && v.abs() < MAX_PLOTTABLE_MAGNITUDE)
    }
}

/// Server-side pagination descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub pages: u32,
}

impl PageInfo {
    pub fn has_more(&self) -> bool {
        self.page < self.pages
    }
}

/// One page of a device's series as returned by the metrics endpoint
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricPage {
    pub samples: Vec<MetricSample>,
    pub pagination: Option<PageInfo>,
}

impl MetricPage {
    pub fn new(samples: Vec<MetricSample>, pagination: Option<PageInfo>) -> Self {
        Self {
            samples,
            pagination,
        }
    }

    /// Without pagination metadata the response is the whole series
    pub fn has_more(&self) -> bool {
        self.pagination.map(|p| p.has_more()).unwrap_or(false)
    }
}
