// CSV encoding of merged chart rows
use crate::domain::chart::{MergedPoint, SeriesLegend};
use crate::error::ApiResult;
use chrono::SecondsFormat;

/// `timestamp,timeLabel,<device…>` with one column per legend entry; gaps stay empty
pub fn merged_points_to_csv(
    series: &[SeriesLegend],
    points: &[MergedPoint],
) -> ApiResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["timestamp".to_string(), "timeLabel".to_string()];
    header.extend(series.iter().map(|s| s.display_name.clone()));
    writer.write_record(&header)?;

    for point in points {
        let mut record = Vec::with_capacity(header.len());
        record.push(point.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true));
        record.push(point.time_label.clone());
        for legend in series {
            record.push(
                point
                    .values
                    .get(&legend.display_name)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| crate::error::ApiError::Csv(e.to_string()))
}
