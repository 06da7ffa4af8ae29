//! In-memory source
//!
//! Serves fixed collections with no network. Used by tests and by the CLI
//! when exercising the stores offline.

use super::DataSource;
use crate::error::{AppError, Result};
use crate::models::{DocumentFull, DocumentPreview, EventFull, EventPreview, Person};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
pub struct MemorySource {
    documents: Vec<DocumentFull>,
    events: Vec<EventFull>,
    people: Vec<Person>,
    /// When set, every call fails with this message
    failure: Option<String>,
    fetches: Arc<AtomicUsize>,
    subscriptions: Arc<Mutex<Vec<String>>>,
}

impl MemorySource {
    pub fn with_documents(mut self, documents: Vec<DocumentPreview>) -> Self {
        self.documents = documents
            .into_iter()
            .map(|preview| DocumentFull {
                preview,
                data: None,
                attachment: None,
            })
            .collect();
        self
    }

    pub fn with_events(mut self, events: Vec<EventPreview>) -> Self {
        self.events = events
            .into_iter()
            .map(|preview| EventFull {
                preview,
                attachment: None,
            })
            .collect();
        self
    }

    pub fn with_people(mut self, people: Vec<Person>) -> Self {
        self.people = people;
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Number of collection fetches served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Emails accepted by `subscribe_to_mailing_list`
    pub async fn subscribed(&self) -> Vec<String> {
        self.subscriptions.lock().await.clone()
    }

    /// Counts the fetch and yields once so concurrent callers can interleave
    async fn begin_fetch(&self) -> Result<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check()
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(AppError::Generic(message.clone())),
            None => Ok(()),
        }
    }
}

fn not_found(kind: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} {}", kind, id))
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_documents(&self) -> Result<Vec<DocumentPreview>> {
        self.begin_fetch().await?;
        Ok(self.documents.iter().map(|d| d.preview.clone()).collect())
    }

    async fn fetch_document(&self, id: &str) -> Result<DocumentFull> {
        self.check()?;
        self.documents
            .iter()
            .find(|d| d.preview.id == id)
            .cloned()
            .ok_or_else(|| not_found("document", id))
    }

    async fn fetch_events(&self) -> Result<Vec<EventPreview>> {
        self.begin_fetch().await?;
        Ok(self.events.iter().map(|e| e.preview.clone()).collect())
    }

    async fn fetch_event(&self, id: &str) -> Result<EventFull> {
        self.check()?;
        self.events
            .iter()
            .find(|e| e.preview.id == id)
            .cloned()
            .ok_or_else(|| not_found("event", id))
    }

    async fn fetch_people(&self) -> Result<Vec<Person>> {
        self.begin_fetch().await?;
        Ok(self.people.clone())
    }

    async fn fetch_person(&self, id: &str) -> Result<Person> {
        self.check()?;
        self.people
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| not_found("person", id))
    }

    async fn subscribe_to_mailing_list(&self, email: &str) -> Result<()> {
        self.check()?;
        self.subscriptions.lock().await.push(email.to_string());
        Ok(())
    }
}
