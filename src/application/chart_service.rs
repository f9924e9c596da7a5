// Chart service - Use case for building multi-device chart projections
use crate::application::air_quality_api::{DEFAULT_PAGE_LIMIT, MetricsApi};
use crate::application::device_service::DeviceService;
use crate::application::multi_device_session::{MultiDeviceSelection, MultiDeviceSession};
use crate::domain::chart::{ChartProjection, legend, merge_by_timestamp, y_axis_domain};
use crate::domain::metric::MetricInfo;
use std::sync::Arc;

#[derive(Clone)]
pub struct ChartService {
    metrics: Arc<dyn MetricsApi>,
    devices: DeviceService,
    page_limit: u32,
}

impl ChartService {
    pub fn new(metrics: Arc<dyn MetricsApi>, devices: DeviceService) -> Self {
        Self {
            metrics,
            devices,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    pub fn metrics_api(&self) -> Arc<dyn MetricsApi> {
        self.metrics.clone()
    }

    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    /// Fetch every selected device and merge the series into chart rows
    pub async fn chart(&self, selection: MultiDeviceSelection) -> ChartProjection {
        let metric = MetricInfo::lookup(&selection.metric);
        let range = selection.range;
        let device_ids = selection.device_ids.clone();

        let session = MultiDeviceSession::new(self.metrics.clone(), selection)
            .with_page_limit(self.page_limit);
        let (state, display_names) = tokio::join!(
            async {
                session.start().await;
                session.snapshot().await
            },
            self.devices.display_names()
        );

        let points = merge_by_timestamp(&state.series, &display_names);
        let y_domain = y_axis_domain(&points);

        tracing::debug!(
            "Chart {} over {} devices: {} rows",
            metric.id,
            device_ids.len(),
            points.len()
        );

        ChartProjection {
            metric,
            range,
            series: legend(&device_ids, &display_names),
            points,
            y_domain,
            failed_devices: state.failed_devices.into_iter().collect(),
        }
    }
}
