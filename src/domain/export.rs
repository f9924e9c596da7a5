// Export domain models
use bytes::Bytes;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of a server-side export as listed by `exported-files/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub pollutant: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl ExportedFile {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// A downloaded export body
#[derive(Debug, Clone)]
pub struct ExportBlob {
    pub filename: Option<String>,
    pub content_type: String,
    pub bytes: Bytes,
}

/// A CSV produced locally from a chart projection
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// `<prefix>_<YYYYmmdd_HHMMSS>.<extension>`
pub fn export_filename(prefix: &str, extension: &str, now: DateTime<Local>) -> String {
    format!("{}_{}.{}", prefix, now.format("%Y%m%d_%H%M%S"), extension)
}
