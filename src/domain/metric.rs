// Metric catalog
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricInfo {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub unit: String,
}

impl MetricInfo {
    fn known(id: &str, name: &str, short_name: &str, unit: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            short_name: short_name.to_string(),
            unit: unit.to_string(),
        }
    }

    /// Catalog entry for `id`, or a bare entry without a unit for unknown metrics
    pub fn lookup(id: &str) -> Self {
        catalog()
            .into_iter()
            .find(|m| m.id == id)
            .unwrap_or_else(|| Self::known(id, id, id, ""))
    }
}

/// Metrics the dashboard offers in its selector
pub fn catalog() -> Vec<MetricInfo> {
    vec![
        MetricInfo::known("VOC", "Volatile Organic Compounds", "VOC", "ppb"),
        MetricInfo::known("O3", "Ozone", "O₃", "ppb"),
        MetricInfo::known("SO2", "Sulfur Dioxide", "SO₂", "ppb"),
        MetricInfo::known("NO2", "Nitrogen Dioxide", "NO₂", "ppb"),
        MetricInfo::known("PM2_5", "PM2.5", "PM₂.₅", "μg/m³"),
        MetricInfo::known("PM10", "PM10", "PM₁₀", "μg/m³"),
        MetricInfo::known("Humidity", "Humidity", "RH", "%"),
        MetricInfo::known("Temperature", "Temperature", "Temp", "°C"),
        MetricInfo::known("Noise", "Noise", "Noise", "dB"),
        MetricInfo::known("Illumination", "Illumination", "Light", "lux"),
    ]
}
