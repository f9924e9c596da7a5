// Single-device series session - paginated fetch with an in-flight guard
use crate::application::air_quality_api::{DEFAULT_PAGE_LIMIT, MetricsApi, SeriesQuery};
use crate::domain::sample::MetricSample;
use crate::domain::time_window::{TimeRange, TimeWindow};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// What a single-device chart is looking at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSelection {
    pub device_id: String,
    pub metric: String,
    pub range: TimeRange,
}

impl SeriesSelection {
    pub fn new(device_id: impl Into<String>, metric: impl Into<String>, range: TimeRange) -> Self {
        Self {
            device_id: device_id.into(),
            metric: metric.into(),
            range,
        }
    }

    fn is_complete(&self) -> bool {
        !self.device_id.is_empty() && !self.metric.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesState {
    pub samples: Vec<MetricSample>,
    pub loading: bool,
    pub error: Option<String>,
    pub next_page: u32,
    pub has_more: bool,
}

impl SeriesState {
    fn fresh() -> Self {
        Self {
            samples: Vec::new(),
            loading: false,
            error: None,
            next_page: 1,
            has_more: true,
        }
    }
}

struct SessionInner {
    selection: SeriesSelection,
    window: TimeWindow,
    state: SeriesState,
    generation: u64,
}

/// Paginated series for one device and metric.
///
/// Pages are only ever requested from the last known cursor and at most one
/// request is in flight per reset. Every reset bumps the generation; a response
/// from an older generation is dropped instead of applied.
pub struct SeriesSession {
    api: Arc<dyn MetricsApi>,
    limit: u32,
    inner: Mutex<SessionInner>,
}

impl SeriesSession {
    pub fn new(api: Arc<dyn MetricsApi>, selection: SeriesSelection) -> Self {
        let window = TimeWindow::resolve(selection.range);
        Self {
            api,
            limit: DEFAULT_PAGE_LIMIT,
            inner: Mutex::new(SessionInner {
                selection,
                window,
                state: SeriesState::fresh(),
                generation: 0,
            }),
        }
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Initial load: clear and fetch the first page
    pub async fn start(&self) {
        self.reset_and_load(None).await;
    }

    /// Switch device, metric or range. Returns false if nothing changed.
    pub async fn select(&self, selection: SeriesSelection) -> bool {
        if self.inner.lock().await.selection == selection {
            return false;
        }
        self.reset_and_load(Some(selection)).await;
        true
    }

    pub async fn change_metric(&self, metric: impl Into<String>) {
        let mut selection = self.selection().await;
        selection.metric = metric.into();
        self.reset_and_load(Some(selection)).await;
    }

    /// Fetch the next page. No-op while a request is in flight or when the
    /// series is complete; returns whether a request was issued.
    pub async fn load_more(&self) -> bool {
        let (query, generation) = {
            let mut inner = self.inner.lock().await;
            if inner.state.loading || !inner.state.has_more || !inner.selection.is_complete() {
                tracing::debug!(
                    "Ignoring load_more for {}/{} (loading={}, has_more={})",
                    inner.selection.device_id,
                    inner.selection.metric,
                    inner.state.loading,
                    inner.state.has_more
                );
                return false;
            }
            inner.state.loading = true;
            inner.state.error = None;
            let page = inner.state.next_page;
            (self.query(&inner, page), inner.generation)
        };

        self.fetch_and_apply(query, generation, false).await;
        true
    }

    pub async fn snapshot(&self) -> SeriesState {
        self.inner.lock().await.state.clone()
    }

    pub async fn selection(&self) -> SeriesSelection {
        self.inner.lock().await.selection.clone()
    }

    pub async fn window(&self) -> TimeWindow {
        self.inner.lock().await.window
    }

    async fn reset_and_load(&self, selection: Option<SeriesSelection>) {
        let prepared = {
            let mut inner = self.inner.lock().await;
            if let Some(selection) = selection {
                inner.selection = selection;
            }
            inner.generation += 1;
            // One window per reset keeps page boundaries stable across load_more
            inner.window = TimeWindow::resolve(inner.selection.range);
            inner.state = SeriesState::fresh();

            if inner.selection.is_complete() {
                inner.state.loading = true;
                Some((self.query(&inner, 1), inner.generation))
            } else {
                inner.state.has_more = false;
                None
            }
        };

        if let Some((query, generation)) = prepared {
            self.fetch_and_apply(query, generation, true).await;
        }
    }

    fn query(&self, inner: &SessionInner, page: u32) -> SeriesQuery {
        SeriesQuery {
            device_id: inner.selection.device_id.clone(),
            metric: inner.selection.metric.clone(),
            window: inner.window,
            page,
            limit: self.limit,
        }
    }

    async fn fetch_and_apply(&self, query: SeriesQuery, generation: u64, reset: bool) {
        let result = self.api.fetch_metric_page(&query).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            tracing::debug!(
                "Discarding stale page {} for {}/{}",
                query.page,
                query.device_id,
                query.metric
            );
            return;
        }

        let state = &mut inner.state;
        state.loading = false;
        match result {
            Ok(page) => {
                let has_more = page.has_more();
                tracing::debug!(
                    "Loaded page {} for {}/{}: {} samples, has_more={}",
                    query.page,
                    query.device_id,
                    query.metric,
                    page.samples.len(),
                    has_more
                );
                if reset {
                    state.samples = page.samples;
                } else {
                    state.samples.extend(page.samples);
                }
                state.has_more = has_more;
                state.next_page = if has_more { query.page + 1 } else { query.page };
            }
            Err(err) => {
                tracing::warn!(
                    "Failed to load page {} for {}/{}: {}",
                    query.page,
                    query.device_id,
                    query.metric,
                    err
                );
                state.error = Some(err.to_string());
                state.has_more = false;
            }
        }
    }
}
