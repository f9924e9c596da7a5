// Device service - Use case for listing devices and map markers
use crate::application::air_quality_api::DeviceApi;
use crate::domain::device::{Device, MapLocation};
use crate::error::ApiResult;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct DeviceService {
    api: Arc<dyn DeviceApi>,
}

impl DeviceService {
    pub fn new(api: Arc<dyn DeviceApi>) -> Self {
        Self { api }
    }

    pub async fn devices(&self) -> ApiResult<Vec<Device>> {
        self.api.list_devices().await
    }

    pub async fn map_locations(&self) -> ApiResult<Vec<MapLocation>> {
        let devices = self.api.list_devices().await?;
        Ok(devices.iter().map(Device::to_map_location).collect())
    }

    /// Device id to legend label; an unavailable device list yields an empty map
    pub async fn display_names(&self) -> HashMap<String, String> {
        match self.api.list_devices().await {
            Ok(devices) => devices
                .into_iter()
                .map(|d| (d.id.clone(), d.label().to_string()))
                .collect(),
            Err(e) => {
                tracing::warn!("Device list unavailable, using ids as names: {}", e);
                HashMap::new()
            }
        }
    }
}
