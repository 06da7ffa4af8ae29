//! Application state and initialization
//!
//! This module wires the selected data source into every store.
//! All services are initialized here and made available through AppState.

use crate::error::Result;
use crate::services::settings::{AppSettings, SourceKind};
use crate::services::{DealsService, EventsService, MailingService, PeopleService, SettingsService};
use crate::source::{AirtableSource, BackendSource, DataSource};
use std::path::Path;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub settings: AppSettings,
    pub deals: Arc<DealsService>,
    pub events: Arc<EventsService>,
    pub people: Arc<PeopleService>,
    pub mailing: MailingService,
}

impl AppState {
    /// Build the source named by `settings` and the stores on top of it
    pub fn new(settings: AppSettings) -> Result<Self> {
        let source: Arc<dyn DataSource> = match settings.source {
            SourceKind::Backend => {
                tracing::info!("Using backend source at {}", settings.backend_url);
                Arc::new(BackendSource::new(
                    &settings.backend_url,
                    settings.request_timeout_secs,
                )?)
            }
            SourceKind::Airtable => {
                tracing::info!("Using Airtable base {}", settings.airtable.base_id);
                Arc::new(AirtableSource::new(
                    &settings.airtable,
                    settings.request_timeout_secs,
                )?)
            }
        };

        Ok(Self::with_source(settings, source))
    }

    /// Stores over an already constructed source
    pub fn with_source(settings: AppSettings, source: Arc<dyn DataSource>) -> Self {
        Self {
            settings,
            deals: Arc::new(DealsService::new(Arc::clone(&source))),
            events: Arc::new(EventsService::new(Arc::clone(&source))),
            people: Arc::new(PeopleService::new(Arc::clone(&source))),
            mailing: MailingService::new(source),
        }
    }
}

/// Application setup - called once on startup
///
/// Loads (or creates) the settings file in `data_dir`, applies environment
/// overrides and an optional source override, then builds the state.
pub async fn setup(data_dir: &Path, source_override: Option<SourceKind>) -> Result<AppState> {
    tracing::info!("Initializing data layer");
    tracing::info!("Data directory: {:?}", data_dir);

    tokio::fs::create_dir_all(data_dir).await?;

    let settings_service = SettingsService::new(data_dir.to_path_buf());
    let mut settings = settings_service.load().await?.with_env_overrides();
    if let Some(source) = source_override {
        settings.source = source;
    }

    let state = AppState::new(settings)?;
    tracing::info!("Data layer initialized successfully");

    Ok(state)
}
