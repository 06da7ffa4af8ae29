//! People service
//!
//! Holds the people directory.

use crate::config::PEOPLE_LOAD_ERROR;
use crate::error::Result;
use crate::models::Person;
use crate::services::loader::{CollectionLoader, LoadStatus, Loadable};
use crate::source::DataSource;
use std::sync::Arc;
use tokio::sync::watch;

pub struct PeopleService {
    source: Arc<dyn DataSource>,
    loader: CollectionLoader<Person>,
}

impl PeopleService {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            loader: CollectionLoader::new(PEOPLE_LOAD_ERROR),
        }
    }

    pub async fn load(&self) {
        tracing::info!("Loading people");
        let source = Arc::clone(&self.source);
        self.loader
            .load(|| async move { source.fetch_people().await })
            .await;
    }

    pub async fn ensure_loaded(&self) {
        let source = Arc::clone(&self.source);
        self.loader
            .ensure_loaded(|| async move { source.fetch_people().await })
            .await;
    }

    pub fn state(&self) -> Loadable<Person> {
        self.loader.borrow().clone()
    }

    pub fn status(&self) -> LoadStatus {
        self.loader.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<Loadable<Person>> {
        self.loader.subscribe()
    }

    /// Person with `id` among the loaded entries
    pub fn find(&self, id: &str) -> Option<Person> {
        self.loader.borrow().items().iter().find(|p| p.id == id).cloned()
    }

    /// Fetch one person from the source, bypassing the loaded collection
    pub async fn fetch_person(&self, id: &str) -> Result<Person> {
        tracing::debug!("Fetching person {}", id);
        self.source.fetch_person(id).await
    }
}
