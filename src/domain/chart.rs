// Chart projection: per-device series merged into timestamp-aligned rows
use super::metric::MetricInfo;
use super::sample::MetricSample;
use super::time_window::TimeRange;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Line colours assigned to devices in selection order
pub const LINE_COLORS: [&str; 8] = [
    "#8884d8", "#82ca9d", "#ff7300", "#ff0000", "#00ff00", "#0000ff", "#ff00ff", "#ffff00",
];

/// Y axis used when there is nothing to plot
pub const EMPTY_Y_DOMAIN: (f64, f64) = (0.0, 10.0);

/// One chart row; `values` is keyed by device display name and is sparse
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedPoint {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "timeLabel")]
    pub time_label: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesLegend {
    pub device_id: String,
    pub display_name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartProjection {
    pub metric: MetricInfo,
    pub range: TimeRange,
    pub series: Vec<SeriesLegend>,
    pub points: Vec<MergedPoint>,
    pub y_domain: (f64, f64),
    pub failed_devices: Vec<String>,
}

pub fn legend(
    device_ids: &[String],
    display_names: &HashMap<String, String>,
) -> Vec<SeriesLegend> {
    let labels = series_labels(device_ids, display_names);
    device_ids
        .iter()
        .enumerate()
        .map(|(index, id)| SeriesLegend {
            device_id: id.clone(),
            display_name: display_name(id, &labels),
            color: LINE_COLORS[index % LINE_COLORS.len()].to_string(),
        })
        .collect()
}

/// Column label per device, unique across `device_ids`.
///
/// Every device whose display name is shared with another selected device is
/// labelled `"<name> (<id>)"`, independent of selection order.
pub fn series_labels<'a>(
    device_ids: impl IntoIterator<Item = &'a String>,
    display_names: &HashMap<String, String>,
) -> HashMap<String, String> {
    let ids: BTreeSet<&String> = device_ids.into_iter().collect();
    let mut uses: HashMap<String, usize> = HashMap::new();
    for id in &ids {
        *uses.entry(display_name(id, display_names)).or_default() += 1;
    }

    ids.into_iter()
        .map(|id| {
            let name = display_name(id, display_names);
            let label = if uses.get(&name).copied().unwrap_or(0) > 1 && name != *id {
                format!("{} ({})", name, id)
            } else {
                name
            };
            (id.clone(), label)
        })
        .collect()
}

pub fn display_name(device_id: &str, display_names: &HashMap<String, String>) -> String {
    display_names
        .get(device_id)
        .cloned()
        .unwrap_or_else(|| device_id.to_string())
}

pub fn time_label(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

/// Merge per-device series into rows aligned on exact timestamps.
///
/// Devices on different sampling clocks do not align and produce sparse rows.
/// Rows where no device has a plottable value are dropped. Values are keyed by
/// [`series_labels`], so devices sharing a display name keep separate columns.
pub fn merge_by_timestamp(
    series: &BTreeMap<String, Vec<MetricSample>>,
    display_names: &HashMap<String, String>,
) -> Vec<MergedPoint> {
    let labels = series_labels(series.keys(), display_names);
    let timestamps: BTreeSet<DateTime<Utc>> = series
        .values()
        .flat_map(|samples| samples.iter().map(|s| s.timestamp))
        .collect();

    // First sample per timestamp wins, like a linear find over the series
    let indexed: Vec<(String, HashMap<DateTime<Utc>, &MetricSample>)> = series
        .iter()
        .map(|(device_id, samples)| {
            let mut by_time = HashMap::with_capacity(samples.len());
            for sample in samples {
                by_time.entry(sample.timestamp).or_insert(sample);
            }
            (display_name(device_id, &labels), by_time)
        })
        .collect();

    timestamps
        .into_iter()
        .filter_map(|timestamp| {
            let values: BTreeMap<String, f64> = indexed
                .iter()
                .filter_map(|(name, by_time)| {
                    by_time
                        .get(&timestamp)
                        .and_then(|s| s.plottable_value())
                        .map(|v| (name.clone(), v))
                })
                .collect();

            if values.is_empty() {
                return None;
            }

            Some(MergedPoint {
                timestamp,
                time_label: time_label(timestamp),
                values,
            })
        })
        .collect()
}

/// Y axis bounds over all plotted values, padded by 10%.
///
/// Non-negative data is floored at zero; negative data keeps its padded minimum.
pub fn y_axis_domain(points: &[MergedPoint]) -> (f64, f64) {
    let mut values = points.iter().flat_map(|p| p.values.values().copied());
    let Some(first) = values.next() else {
        return EMPTY_Y_DOMAIN;
    };

    let (mut min, mut max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if min == max {
        min -= 1.0;
        max += 1.0;
    }

    let padding = (max - min) * 0.1;
    let lower = if min >= 0.0 {
        (min - padding).max(0.0)
    } else {
        min - padding
    };
    (lower, max + padding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn samples(device: &str, rows: &[(&str, Option<f64>)]) -> Vec<MetricSample> {
        rows.iter()
            .map(|(t, v)| MetricSample::new(at(t), *v, device))
            .collect()
    }

    fn names() -> HashMap<String, String> {
        HashMap::from([
            ("a".to_string(), "Alpha".to_string()),
            ("b".to_string(), "Bravo".to_string()),
        ])
    }

    #[test]
    fn test_disjoint_timestamps_produce_sparse_rows() {
        let series = BTreeMap::from([
            (
                "a".to_string(),
                samples(
                    "a",
                    &[
                        ("2024-01-01T00:00:00Z", Some(1.0)),
                        ("2024-01-01T02:00:00Z", Some(2.0)),
                    ],
                ),
            ),
            (
                "b".to_string(),
                samples("b", &[("2024-01-01T01:00:00Z", Some(3.0))]),
            ),
        ]);

        let merged = merge_by_timestamp(&series, &names());

        assert_eq!(merged.len(), 3);
        for point in &merged {
            assert_eq!(point.values.len(), 1);
        }
        assert_eq!(merged[0].values.get("Alpha"), Some(&1.0));
        assert_eq!(merged[1].values.get("Bravo"), Some(&3.0));
        assert_eq!(merged[2].values.get("Alpha"), Some(&2.0));
    }

    #[test]
    fn test_shared_timestamp_merges_into_one_row() {
        let series = BTreeMap::from([
            ("a".to_string(), samples("a", &[("2024-01-01T00:00:00Z", Some(5.0))])),
            ("b".to_string(), samples("b", &[("2024-01-01T00:00:00Z", Some(5.0))])),
        ]);

        let merged = merge_by_timestamp(&series, &names());

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].values.get("Alpha"), Some(&5.0));
        assert_eq!(merged[0].values.get("Bravo"), Some(&5.0));
    }

    #[test]
    fn test_invalid_values_are_dropped_from_row_only() {
        let series = BTreeMap::from([
            (
                "a".to_string(),
                samples(
                    "a",
                    &[
                        ("2024-01-01T00:00:00Z", Some(f64::NAN)),
                        ("2024-01-01T01:00:00Z", None),
                        ("2024-01-01T02:00:00Z", Some(1e10)),
                    ],
                ),
            ),
            (
                "b".to_string(),
                samples(
                    "b",
                    &[
                        ("2024-01-01T00:00:00Z", Some(1.0)),
                        ("2024-01-01T01:00:00Z", Some(2.0)),
                        ("2024-01-01T02:00:00Z", Some(3.0)),
                    ],
                ),
            ),
        ]);

        let merged = merge_by_timestamp(&series, &names());

        assert_eq!(merged.len(), 3);
        for point in &merged {
            assert!(!point.values.contains_key("Alpha"));
            assert!(point.values.contains_key("Bravo"));
        }
    }

    #[test]
    fn test_rows_without_any_value_are_dropped() {
        let series = BTreeMap::from([
            ("a".to_string(), samples("a", &[("2024-01-01T00:00:00Z", None)])),
            ("b".to_string(), samples("b", &[("2024-01-01T00:00:00Z", Some(-1e11))])),
        ]);

        assert!(merge_by_timestamp(&series, &names()).is_empty());
    }

    #[test]
    fn test_rows_are_sorted_ascending() {
        let series = BTreeMap::from([(
            "a".to_string(),
            samples(
                "a",
                &[
                    ("2024-01-03T00:00:00Z", Some(3.0)),
                    ("2024-01-01T00:00:00Z", Some(1.0)),
                    ("2024-01-02T00:00:00Z", Some(2.0)),
                ],
            ),
        )]);

        let merged = merge_by_timestamp(&series, &names());
        let values: Vec<f64> = merged.iter().map(|p| p.values["Alpha"]).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_unknown_device_uses_id_as_name() {
        let series = BTreeMap::from([(
            "zulu".to_string(),
            samples("zulu", &[("2024-01-01T00:00:00Z", Some(7.0))]),
        )]);

        let merged = merge_by_timestamp(&series, &names());
        assert_eq!(merged[0].values.get("zulu"), Some(&7.0));
    }

    #[test]
    fn test_merged_point_serializes_flat() {
        let series = BTreeMap::from([(
            "a".to_string(),
            samples("a", &[("2024-01-01T00:00:00Z", Some(4.0))]),
        )]);
        let merged = merge_by_timestamp(&series, &names());
        let json = serde_json::to_value(&merged[0]).unwrap();

        assert_eq!(json["timestamp"], 1_704_067_200_000_i64);
        assert_eq!(json["Alpha"], 4.0);
        assert!(json["timeLabel"].is_string());
    }

    #[test]
    fn test_y_axis_domain() {
        assert_eq!(y_axis_domain(&[]), EMPTY_Y_DOMAIN);

        let point = |v: f64| MergedPoint {
            timestamp: at("2024-01-01T00:00:00Z"),
            time_label: String::new(),
            values: BTreeMap::from([("Alpha".to_string(), v)]),
        };

        let (lo, hi) = y_axis_domain(&[point(10.0), point(20.0)]);
        assert!((lo - 9.0).abs() < 1e-9);
        assert!((hi - 21.0).abs() < 1e-9);

        // Flat series widen by one on each side
        let (lo, hi) = y_axis_domain(&[point(5.0)]);
        assert!((lo - 3.8).abs() < 1e-9);
        assert!((hi - 6.2).abs() < 1e-9);

        // Non-negative data never dips below zero
        let (lo, _) = y_axis_domain(&[point(0.0), point(1.0)]);
        assert_eq!(lo, 0.0);
    }

    #[test]
    fn test_y_axis_domain_all_negative() {
        let point = |v: f64| MergedPoint {
            timestamp: at("2024-01-01T00:00:00Z"),
            time_label: String::new(),
            values: BTreeMap::from([("Alpha".to_string(), v)]),
        };

        let (lo, hi) = y_axis_domain(&[point(-5.0), point(-3.0)]);
        assert!((lo - -5.2).abs() < 1e-9);
        assert!((hi - -2.8).abs() < 1e-9);
        assert!(lo < hi);
    }

    #[test]
    fn test_shared_display_name_keeps_devices_apart() {
        let names = HashMap::from([
            ("d1".to_string(), "Park".to_string()),
            ("d2".to_string(), "Park".to_string()),
        ]);
        let series = BTreeMap::from([
            ("d1".to_string(), samples("d1", &[("2024-01-01T00:00:00Z", Some(1.0))])),
            ("d2".to_string(), samples("d2", &[("2024-01-01T00:00:00Z", Some(2.0))])),
        ]);

        let merged = merge_by_timestamp(&series, &names);
        assert_eq!(merged[0].values.get("Park (d1)"), Some(&1.0));
        assert_eq!(merged[0].values.get("Park (d2)"), Some(&2.0));

        // Legend labels match the merged columns whatever the selection order
        let legend = legend(&["d2".to_string(), "d1".to_string()], &names);
        assert_eq!(legend[0].display_name, "Park (d2)");
        assert_eq!(legend[1].display_name, "Park (d1)");
    }

    #[test]
    fn test_legend_cycles_colors() {
        let ids: Vec<String> = (0..9).map(|i| format!("d{}", i)).collect();
        let legend = legend(&ids, &HashMap::new());
        assert_eq!(legend[0].color, LINE_COLORS[0]);
        assert_eq!(legend[8].color, LINE_COLORS[0]);
        assert_eq!(legend[3].display_name, "d3");
    }
}
