//! Site backend source
//!
//! Talks to the site's own JSON API, which serves previews already in
//! view-model shape. Attachment file paths in detail responses are
//! rewritten to the backend's download routes.

use super::{build_http_client, list_or_empty, DataSource};
use crate::error::{AppError, Result};
use crate::models::{DocumentFull, DocumentPreview, EventFull, EventPreview, Person};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;

const CONTEXT: &str = "Backend API error";

/// `DataSource` over the site's JSON API
#[derive(Clone, Debug)]
pub struct BackendSource {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendSource {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Settings(format!("Invalid backend URL {:?}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Settings(format!(
                "Backend URL cannot have paths: {}",
                base_url
            )));
        }

        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url,
        })
    }

    /// Base URL with `segments` appended, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_value(&self, segments: &[&str]) -> Result<serde_json::Value> {
        let url = self.endpoint(segments);
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Backend returned status: {}", status);
            return Err(AppError::status(CONTEXT, status.as_u16()));
        }

        Ok(response.json().await?)
    }

    async fn get_list<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Vec<T>> {
        list_or_empty(self.get_value(segments).await?)
    }

    async fn get_record<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        Ok(serde_json::from_value(self.get_value(segments).await?)?)
    }

    /// Absolute URL for a backend-relative attachment path
    fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.endpoint(&segments).to_string()
    }

    fn with_absolute_photo(&self, mut person: Person) -> Person {
        person.attachment_url = person
            .attachment_url
            .filter(|url| !url.is_empty())
            .map(|url| self.absolute(&url));
        person
    }
}

#[async_trait]
impl DataSource for BackendSource {
    async fn fetch_documents(&self) -> Result<Vec<DocumentPreview>> {
        self.get_list(&["data"]).await
    }

    async fn fetch_document(&self, id: &str) -> Result<DocumentFull> {
        let mut doc: DocumentFull = self.get_record(&["data", "text", id]).await?;
        // The backend reports a server-side file path; expose its download route
        doc.attachment = doc
            .attachment
            .filter(|path| !path.is_empty())
            .map(|_| self.endpoint(&["data", "attachments", id]).to_string());
        Ok(doc)
    }

    async fn fetch_events(&self) -> Result<Vec<EventPreview>> {
        self.get_list(&["events"]).await
    }

    async fn fetch_event(&self, id: &str) -> Result<EventFull> {
        let mut event: EventFull = self.get_record(&["events", id]).await?;
        event.attachment = event
            .attachment
            .filter(|path| !path.is_empty())
            .map(|_| self.endpoint(&["events", "attachments", id]).to_string());
        Ok(event)
    }

    async fn fetch_people(&self) -> Result<Vec<Person>> {
        let people: Vec<Person> = self.get_list(&["people"]).await?;
        Ok(people
            .into_iter()
            .map(|p| self.with_absolute_photo(p))
            .collect())
    }

    async fn fetch_person(&self, id: &str) -> Result<Person> {
        let person: Person = self.get_record(&["people", id]).await?;
        Ok(self.with_absolute_photo(person))
    }

    async fn subscribe_to_mailing_list(&self, email: &str) -> Result<()> {
        let url = self.endpoint(&["mailing"]);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .query(&[("email", email)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::status("Failed to subscribe", status.as_u16()));
        }
        Ok(())
    }
}
