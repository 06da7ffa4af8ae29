//! Settings service
//!
//! Manages data layer settings persistence using JSON file storage.
//! Environment variables override the stored values at startup.

use crate::config::{
    AIRTABLE_API_BASE, AIRTABLE_TOKEN_ENV, BACKEND_URL_ENV, DATA_TABLE, DEFAULT_AIRTABLE_BASE_ID,
    DEFAULT_BACKEND_URL, DEFAULT_REQUEST_TIMEOUT_SECS, EVENTS_TABLE, MAILING_TABLE, PEOPLE_TABLE,
    SETTINGS_FILE,
};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Which upstream the stores read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Backend,
    Airtable,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Backend => "backend",
            SourceKind::Airtable => "airtable",
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "backend" => Ok(SourceKind::Backend),
            "airtable" => Ok(SourceKind::Airtable),
            other => Err(AppError::Settings(format!("Unknown source: {}", other))),
        }
    }
}

/// Direct Airtable access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirtableSettings {
    #[serde(default = "default_airtable_api_base")]
    pub api_base: String,
    #[serde(default = "default_airtable_base_id")]
    pub base_id: String,
    /// Personal access token; usually supplied through the environment
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default = "default_data_table")]
    pub data_table: String,
    #[serde(default = "default_events_table")]
    pub events_table: String,
    #[serde(default = "default_people_table")]
    pub people_table: String,
    #[serde(default = "default_mailing_table")]
    pub mailing_table: String,
}

fn default_airtable_api_base() -> String {
    AIRTABLE_API_BASE.to_string()
}

fn default_airtable_base_id() -> String {
    DEFAULT_AIRTABLE_BASE_ID.to_string()
}

fn default_data_table() -> String {
    DATA_TABLE.to_string()
}

fn default_events_table() -> String {
    EVENTS_TABLE.to_string()
}

fn default_people_table() -> String {
    PEOPLE_TABLE.to_string()
}

fn default_mailing_table() -> String {
    MAILING_TABLE.to_string()
}

impl Default for AirtableSettings {
    fn default() -> Self {
        Self {
            api_base: default_airtable_api_base(),
            base_id: default_airtable_base_id(),
            token: String::new(),
            data_table: default_data_table(),
            events_table: default_events_table(),
            people_table: default_people_table(),
            mailing_table: default_mailing_table(),
        }
    }
}

/// Data layer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default)]
    pub airtable: AirtableSettings,
    /// Per-request timeout in seconds (clamped to 1..=300 when used)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            backend_url: default_backend_url(),
            airtable: AirtableSettings::default(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl AppSettings {
    /// Apply `CIMA_API_URL` and `AIRTABLE_CIMA_PAT` from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; empty values are ignored
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!("Backend URL overridden by {}", BACKEND_URL_ENV);
            self.backend_url = url.trim().to_string();
        }
        if let Some(token) = lookup(AIRTABLE_TOKEN_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!("Airtable token taken from {}", AIRTABLE_TOKEN_ENV);
            self.airtable.token = token.trim().to_string();
        }
        self
    }
}

/// Service for managing data layer settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join(SETTINGS_FILE),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Settings(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Settings(format!("Failed to serialize settings: {}", e)))?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().to_path_buf());
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        let settings = service.load().await.unwrap();

        assert_eq!(settings.source, SourceKind::Backend);
        assert_eq!(settings.backend_url, "http://localhost:8000");
        assert_eq!(settings.airtable.base_id, "appDwuBzzUFQKZqrx");
        assert_eq!(settings.airtable.events_table, "tblz2kaxgRjPtr102");
        assert_eq!(settings.request_timeout_secs, 30);
        assert!(temp.path().join(SETTINGS_FILE).exists());
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().to_path_buf();

        {
            let service = SettingsService::new(settings_path.clone());
            let mut settings = service.load().await.unwrap();
            settings.source = SourceKind::Airtable;
            settings.backend_url = "https://cima.example.com/api".to_string();
            service.save(&settings).await.unwrap();
        }

        {
            let service = SettingsService::new(settings_path);
            let loaded = service.load().await.unwrap();
            assert_eq!(loaded.source, SourceKind::Airtable);
            assert_eq!(loaded.backend_url, "https://cima.example.com/api");
        }
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let (service, temp) = create_test_service();
        tokio::fs::write(
            temp.path().join(SETTINGS_FILE),
            r#"{"source": "airtable", "airtable": {"base_id": "appOther"}}"#,
        )
        .await
        .unwrap();

        let settings = service.load().await.unwrap();

        assert_eq!(settings.source, SourceKind::Airtable);
        assert_eq!(settings.airtable.base_id, "appOther");
        assert_eq!(settings.airtable.data_table, "tblhrPSM9atIrQquv");
        assert_eq!(settings.backend_url, "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_settings_error() {
        let (service, temp) = create_test_service();
        tokio::fs::write(temp.path().join(SETTINGS_FILE), "{not json")
            .await
            .unwrap();

        let result = service.load().await;

        assert!(matches!(result, Err(AppError::Settings(_))));
    }

    #[test]
    fn test_env_overrides() {
        let settings = AppSettings::default().with_overrides_from(|key| match key {
            "CIMA_API_URL" => Some(" https://api.example.com ".to_string()),
            "AIRTABLE_CIMA_PAT" => Some("pat123".to_string()),
            _ => None,
        });

        assert_eq!(settings.backend_url, "https://api.example.com");
        assert_eq!(settings.airtable.token, "pat123");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let settings = AppSettings::default().with_overrides_from(|_| Some("  ".to_string()));

        assert_eq!(settings.backend_url, "http://localhost:8000");
        assert!(settings.airtable.token.is_empty());
    }

    #[test]
    fn test_token_is_not_written_when_empty() {
        let json = serde_json::to_string(&AppSettings::default()).unwrap();
        assert!(!json.contains("token"));
    }

    #[test]
    fn test_source_kind_parsing() {
        assert_eq!("Airtable".parse::<SourceKind>().unwrap(), SourceKind::Airtable);
        assert_eq!("backend".parse::<SourceKind>().unwrap(), SourceKind::Backend);
        assert!("sheets".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_source_kind_name_matches_settings_file() {
        for kind in [SourceKind::Backend, SourceKind::Airtable] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
        }
    }
}
