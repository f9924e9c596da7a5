// Device domain model
use serde::Serialize;

/// Fallback coordinates for devices that report no position
pub const DEFAULT_LATITUDE: f64 = 27.8006;
pub const DEFAULT_LONGITUDE: f64 = -97.3964;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub device_type: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Device {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            display_name: None,
            device_type: Self::infer_type(&id).to_string(),
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            id,
        }
    }

    /// Devices named after a VOC site are air-quality sensors, the rest battery monitors
    pub fn infer_type(site_name: &str) -> &'static str {
        if site_name.contains("VOC") {
            "VOC"
        } else {
            "battery"
        }
    }

    /// Name shown in chart legends and merged rows
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.id)
    }

    pub fn to_map_location(&self) -> MapLocation {
        MapLocation {
            lat: self.latitude,
            lng: self.longitude,
            name: if self.name.is_empty() {
                self.id.clone()
            } else {
                self.name.clone()
            },
            device: self.id.clone(),
        }
    }
}

/// Marker input for the map view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLocation {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub device: String,
}
