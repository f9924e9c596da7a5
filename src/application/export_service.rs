// Export service - CSV downloads of chart data and server-side exports
use crate::application::air_quality_api::{AccountApi, ExportApi};
use crate::application::chart_service::ChartService;
use crate::application::multi_device_session::MultiDeviceSelection;
use crate::domain::export::{CsvExport, ExportBlob, ExportedFile, export_filename};
use crate::error::{ApiError, ApiResult};
use crate::infrastructure::csv_export::merged_points_to_csv;
use chrono::{Local, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct ExportService {
    account: Arc<dyn AccountApi>,
    exports: Arc<dyn ExportApi>,
    charts: ChartService,
}

impl ExportService {
    pub fn new(
        account: Arc<dyn AccountApi>,
        exports: Arc<dyn ExportApi>,
        charts: ChartService,
    ) -> Self {
        Self {
            account,
            exports,
            charts,
        }
    }

    /// Build the chart for `selection` and encode its rows as CSV.
    ///
    /// Restricted to admin roles. A chart without rows is an error
    /// rather than a header-only file.
    pub async fn export_chart_csv(&self, selection: MultiDeviceSelection) -> ApiResult<CsvExport> {
        let user = self.account.current_user().await?;
        if !user.can_export() {
            return Err(ApiError::Forbidden(format!(
                "role '{}' may not export data",
                user.role
            )));
        }

        let chart = self.charts.chart(selection).await;
        if chart.points.is_empty() {
            return Err(ApiError::EmptyExport);
        }

        let bytes = merged_points_to_csv(&chart.series, &chart.points)?;
        let filename = export_filename(&chart.metric.id, "csv", Local::now());
        tracing::info!(
            "Exported {} rows of {} for {}",
            chart.points.len(),
            chart.metric.id,
            user.email
        );

        Ok(CsvExport { filename, bytes })
    }

    /// Server-side exports that can still be downloaded
    pub async fn list_exports(&self) -> ApiResult<Vec<ExportedFile>> {
        let now = Utc::now();
        let files = self.exports.list_exports().await?;
        Ok(files.into_iter().filter(|f| !f.is_expired(now)).collect())
    }

    pub async fn download(&self, id: i64) -> ApiResult<ExportBlob> {
        self.exports.download_export(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::device_service::DeviceService;
    use crate::application::fakes::{
        FakeAccountApi, FakeDeviceApi, FakeExportApi, FakeMetricsApi, hourly, user,
    };
    use crate::domain::sample::MetricPage;
    use crate::domain::time_window::TimeRange;

    fn service(
        role: Option<&str>,
        metrics: FakeMetricsApi,
        files: Vec<ExportedFile>,
    ) -> ExportService {
        let account = FakeAccountApi {
            current: role.map(user),
            ..Default::default()
        };
        let charts = ChartService::new(
            Arc::new(metrics),
            DeviceService::new(Arc::new(FakeDeviceApi::default())),
        );
        ExportService::new(Arc::new(account), Arc::new(FakeExportApi { files }), charts)
    }

    fn selection() -> MultiDeviceSelection {
        MultiDeviceSelection::new(vec!["d1".to_string()], "VOC", TimeRange::Day)
    }

    #[tokio::test]
    async fn test_admin_exports_csv() {
        let metrics =
            FakeMetricsApi::new(|q| Ok(MetricPage::new(hourly(&q.device_id, 0, 2), None)));

        let export = service(Some("admin"), metrics, vec![])
            .export_chart_csv(selection())
            .await
            .unwrap();

        assert!(export.filename.starts_with("VOC_"));
        assert!(export.filename.ends_with(".csv"));
        let text = String::from_utf8(export.bytes).unwrap();
        assert!(text.starts_with("timestamp,timeLabel,d1\n"));
        assert_eq!(text.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_viewer_is_forbidden() {
        let metrics =
            FakeMetricsApi::new(|q| Ok(MetricPage::new(hourly(&q.device_id, 0, 2), None)));
        let service = service(Some("viewer"), metrics, vec![]);

        assert!(matches!(
            service.export_chart_csv(selection()).await,
            Err(ApiError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_signed_out_export_fails() {
        let metrics = FakeMetricsApi::new(|_| Ok(MetricPage::default()));
        let service = service(None, metrics, vec![]);

        assert!(matches!(
            service.export_chart_csv(selection()).await,
            Err(ApiError::SessionExpired)
        ));
    }

    #[tokio::test]
    async fn test_empty_chart_is_not_exported() {
        let metrics = FakeMetricsApi::new(|_| Ok(MetricPage::default()));
        let service = service(Some("superadmin"), metrics, vec![]);

        assert!(matches!(
            service.export_chart_csv(selection()).await,
            Err(ApiError::EmptyExport)
        ));
    }

    #[tokio::test]
    async fn test_download_passes_through() {
        let file: ExportedFile =
            serde_json::from_str(r#"{"id": 3, "filename": "PM25_20240101_000000.csv"}"#).unwrap();
        let metrics = FakeMetricsApi::new(|_| Ok(MetricPage::default()));
        let service = service(Some("admin"), metrics, vec![file]);

        assert_eq!(service.list_exports().await.unwrap().len(), 1);
        let blob = service.download(3).await.unwrap();
        assert_eq!(blob.filename.as_deref(), Some("PM25_20240101_000000.csv"));
        assert!(service.download(9).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_exports_are_hidden() {
        let files: Vec<ExportedFile> = serde_json::from_str(
            r#"[{"id": 1, "filename": "old.csv", "expires_at": "2020-01-01T00:00:00Z"},
                {"id": 2, "filename": "fresh.csv", "expires_at": "2999-01-01T00:00:00Z"},
                {"id": 3, "filename": "forever.csv"}]"#,
        )
        .unwrap();
        let metrics = FakeMetricsApi::new(|_| Ok(MetricPage::default()));
        let service = service(Some("admin"), metrics, files);

        let listed: Vec<i64> = service
            .list_exports()
            .await
            .unwrap()
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(listed, vec![2, 3]);
    }
}
