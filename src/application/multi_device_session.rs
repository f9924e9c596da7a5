// Multi-device session - parallel per-device fetch with failure isolation
use crate::application::air_quality_api::{DEFAULT_PAGE_LIMIT, MetricsApi, SeriesQuery};
use crate::domain::sample::MetricSample;
use crate::domain::time_window::{TimeRange, TimeWindow};
use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiDeviceSelection {
    pub device_ids: Vec<String>,
    pub metric: String,
    pub range: TimeRange,
}

impl MultiDeviceSelection {
    /// Duplicate ids are dropped, first occurrence wins
    pub fn new(
        device_ids: impl IntoIterator<Item = String>,
        metric: impl Into<String>,
        range: TimeRange,
    ) -> Self {
        let mut seen = HashSet::new();
        let device_ids = device_ids
            .into_iter()
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();
        Self {
            device_ids,
            metric: metric.into(),
            range,
        }
    }

    fn is_complete(&self) -> bool {
        !self.device_ids.is_empty() && !self.metric.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MultiDeviceState {
    pub series: BTreeMap<String, Vec<MetricSample>>,
    pub loading: bool,
    pub failed_devices: BTreeSet<String>,
}

/// Outcome of fetching one device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSeries {
    pub device_id: String,
    pub samples: Vec<MetricSample>,
    pub failed: bool,
}

/// Fetch the first page for one device; failures degrade to an empty series
pub async fn fetch_device_series(api: &dyn MetricsApi, query: SeriesQuery) -> DeviceSeries {
    match api.fetch_metric_page(&query).await {
        Ok(page) => DeviceSeries {
            device_id: query.device_id,
            samples: page.samples,
            failed: false,
        },
        Err(err) => {
            tracing::warn!(
                "Failed to fetch {} for device {}: {}",
                query.metric,
                query.device_id,
                err
            );
            DeviceSeries {
                device_id: query.device_id,
                samples: Vec::new(),
                failed: true,
            }
        }
    }
}

/// First-page queries for every selected device over one shared window
pub fn device_queries(
    selection: &MultiDeviceSelection,
    window: TimeWindow,
    limit: u32,
) -> Vec<SeriesQuery> {
    selection
        .device_ids
        .iter()
        .map(|device_id| SeriesQuery {
            device_id: device_id.clone(),
            metric: selection.metric.clone(),
            window,
            page: 1,
            limit,
        })
        .collect()
}

struct SessionInner {
    selection: MultiDeviceSelection,
    state: MultiDeviceState,
    generation: u64,
}

/// Per-device series for a set of devices and one metric.
///
/// Any change to the selection is a full reset and refetch. A batch whose
/// generation was superseded while in flight is dropped.
pub struct MultiDeviceSession {
    api: Arc<dyn MetricsApi>,
    limit: u32,
    inner: Mutex<SessionInner>,
}

impl MultiDeviceSession {
    pub fn new(api: Arc<dyn MetricsApi>, selection: MultiDeviceSelection) -> Self {
        Self {
            api,
            limit: DEFAULT_PAGE_LIMIT,
            inner: Mutex::new(SessionInner {
                selection,
                state: MultiDeviceState::default(),
                generation: 0,
            }),
        }
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Initial load for the current selection
    pub async fn start(&self) {
        self.reset_and_load(None).await;
    }

    /// Replace the selection; returns false if nothing changed
    pub async fn select(&self, selection: MultiDeviceSelection) -> bool {
        if self.inner.lock().await.selection == selection {
            return false;
        }
        self.reset_and_load(Some(selection)).await;
        true
    }

    /// Clear everything and refetch all selected devices under `metric`
    pub async fn change_metric(&self, metric: impl Into<String>) {
        let mut selection = self.selection().await;
        selection.metric = metric.into();
        self.reset_and_load(Some(selection)).await;
    }

    pub async fn snapshot(&self) -> MultiDeviceState {
        self.inner.lock().await.state.clone()
    }

    pub async fn selection(&self) -> MultiDeviceSelection {
        self.inner.lock().await.selection.clone()
    }

    async fn reset_and_load(&self, selection: Option<MultiDeviceSelection>) {
        let (queries, generation) = {
            let mut inner = self.inner.lock().await;
            if let Some(selection) = selection {
                inner.selection = selection;
            }
            inner.generation += 1;
            inner.state = MultiDeviceState::default();

            if !inner.selection.is_complete() {
                return;
            }

            inner.state.loading = true;
            let window = TimeWindow::resolve(inner.selection.range);
            (device_queries(&inner.selection, window, self.limit), inner.generation)
        };

        tracing::debug!("Fetching {} devices (generation {})", queries.len(), generation);
        let api = self.api.as_ref();
        let results = join_all(queries.into_iter().map(|q| fetch_device_series(api, q))).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            tracing::debug!("Discarding stale multi-device batch (generation {})", generation);
            return;
        }

        let state = &mut inner.state;
        for result in results {
            if result.failed {
                state.failed_devices.insert(result.device_id.clone());
            }
            state.series.insert(result.device_id, result.samples);
        }
        state.loading = false;
    }
}
