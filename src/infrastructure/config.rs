use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::air_quality_api::DEFAULT_PAGE_LIMIT;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_session_path() -> PathBuf {
    PathBuf::from(".airq/session.json")
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_limit: default_page_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `config/dashboard.{toml,...}` if present, overridden by `AIRQ__SECTION__KEY` variables
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("AIRQ").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_dashboard_config(toml: &str) -> anyhow::Result<DashboardConfig> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    #[test]
    fn test_defaults_apply_to_empty_config() {
        let config = parse_dashboard_config("").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.api.page_limit, 500);
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.session.path, PathBuf::from(".airq/session.json"));
    }

    #[test]
    fn test_partial_sections() {
        let config = parse_dashboard_config(
            r#"
            [api]
            base_url = "https://aq.example.org/api"
            page_limit = 250

            [server]
            bind = "127.0.0.1:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://aq.example.org/api");
        assert_eq!(config.api.page_limit, 250);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.server.bind, "127.0.0.1:9000");
    }
}
