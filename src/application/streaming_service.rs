// Streaming chart service - Progressive loading, one event per device as it settles
use crate::application::air_quality_api::MetricsApi;
use crate::application::device_service::DeviceService;
use crate::application::multi_device_session::{
    MultiDeviceSelection, device_queries, fetch_device_series,
};
use crate::domain::chart::{SeriesLegend, display_name, legend, series_labels};
use crate::domain::metric::MetricInfo;
use crate::domain::sample::MetricSample;
use crate::domain::time_window::{TimeRange, TimeWindow};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartEvent {
    Skeleton {
        metric: MetricInfo,
        range: TimeRange,
        series: Vec<SeriesLegend>,
    },
    /// `samples` holds only chart-ready values; nulls and out-of-range readings are dropped
    SeriesUpdate {
        device_id: String,
        display_name: String,
        samples: Vec<MetricSample>,
        failed: bool,
    },
    Complete {
        devices: usize,
        failed: usize,
        duration_ms: i64,
    },
}

#[derive(Clone)]
pub struct StreamingChartService {
    metrics: Arc<dyn MetricsApi>,
    devices: DeviceService,
    page_limit: u32,
}

impl StreamingChartService {
    pub fn new(metrics: Arc<dyn MetricsApi>, devices: DeviceService, page_limit: u32) -> Self {
        Self {
            metrics,
            devices,
            page_limit,
        }
    }

    pub async fn stream_chart(
        &self,
        selection: MultiDeviceSelection,
    ) -> mpsc::Receiver<ChartEvent> {
        let (tx, rx) = mpsc::channel(100);
        let start_time = Instant::now();

        // 1. Skeleton first so the legend can render before any data
        let display_names = self.devices.display_names().await;
        let skeleton = ChartEvent::Skeleton {
            metric: MetricInfo::lookup(&selection.metric),
            range: selection.range,
            series: legend(&selection.device_ids, &display_names),
        };
        let labels = series_labels(&selection.device_ids, &display_names);
        let _ = tx.send(skeleton).await;

        // 2. One task per device
        let window = TimeWindow::resolve(selection.range);
        let queries = if selection.metric.is_empty() {
            Vec::new()
        } else {
            device_queries(&selection, window, self.page_limit)
        };
        let total = queries.len();

        let mut handles = Vec::with_capacity(total);
        for query in queries {
            let tx = tx.clone();
            let api = self.metrics.clone();
            let name = display_name(&query.device_id, &labels);

            handles.push(tokio::spawn(async move {
                let result = fetch_device_series(api.as_ref(), query).await;
                let failed = result.failed;
                let update = ChartEvent::SeriesUpdate {
                    device_id: result.device_id,
                    display_name: name,
                    samples: result
                        .samples
                        .into_iter()
                        .filter(|s| s.plottable_value().is_some())
                        .collect(),
                    failed,
                };
                let _ = tx.send(update).await;
                failed
            }));
        }

        // 3. Completion once every device task has settled
        tokio::spawn(async move {
            let outcomes = join_all(handles).await;
            let failed = outcomes
                .iter()
                .filter(|outcome| !matches!(outcome, Ok(false)))
                .count();
            let complete = ChartEvent::Complete {
                devices: total,
                failed,
                duration_ms: start_time.elapsed().as_millis() as i64,
            };
            tracing::debug!("Chart stream complete: {} devices, {} failed", total, failed);
            let _ = tx.send(complete).await;
        });

        rx
    }
}
