//! Direct Airtable source
//!
//! Reads the CIMA tables through the Airtable REST API and normalizes each
//! `{id, fields}` record into the view models. List reads follow the
//! `offset` cursor until the table is exhausted.

use super::{build_http_client, list_or_empty, DataSource};
use crate::error::{AppError, Result};
use crate::models::{
    DataType, DocumentFull, DocumentPreview, EventFull, EventPreview, EventStatus, Person,
};
use crate::services::settings::AirtableSettings;
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const CONTEXT: &str = "Airtable API error";

/// Raw Airtable record
#[derive(Debug, Deserialize)]
struct AirtableRecord<F> {
    id: String,
    #[serde(default)]
    fields: F,
}

/// One page of a table listing
#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    records: serde_json::Value,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Attachment {
    #[serde(default)]
    url: Option<String>,
}

/// Linked author records expose `name`; plain text columns are bare strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthorField {
    Named { name: String },
    Plain(String),
}

impl AuthorField {
    fn into_name(self) -> String {
        match self {
            AuthorField::Named { name } => name,
            AuthorField::Plain(name) => name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct DocumentFields {
    name: Option<String>,
    summary: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    creation_time: Option<String>,
    last_modified: Option<String>,
    #[serde(default)]
    authors: Vec<AuthorField>,
    data: Option<String>,
    #[serde(default)]
    attachment: Vec<Attachment>,
}

#[derive(Debug, Default, Deserialize)]
struct EventFields {
    name: Option<String>,
    summary: Option<String>,
    status: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    date: Option<String>,
    location_url: Option<String>,
    registration_url: Option<String>,
    #[serde(default)]
    attachment: Vec<Attachment>,
}

#[derive(Debug, Default, Deserialize)]
struct PersonFields {
    name: Option<String>,
    tagline: Option<String>,
    description: Option<String>,
    email: Option<String>,
    linkedin: Option<String>,
    #[serde(default)]
    photo: Vec<Attachment>,
    #[serde(default)]
    attachment: Vec<Attachment>,
    #[serde(default)]
    attachments: Vec<Attachment>,
}

/// Empty strings count as missing, like absent fields
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn first_url(attachments: Vec<Attachment>) -> Option<String> {
    attachments.into_iter().next().and_then(|a| non_empty(a.url))
}

fn to_document(record: AirtableRecord<DocumentFields>) -> DocumentFull {
    let fields = record.fields;
    let kind = non_empty(fields.kind).unwrap_or_else(|| DataType::Report.as_str().to_string());

    DocumentFull {
        preview: DocumentPreview {
            id: record.id,
            name: fields.name.unwrap_or_default(),
            summary: fields.summary.unwrap_or_default(),
            kind: DataType::from(kind),
            creation_time: fields.creation_time.unwrap_or_default(),
            last_modified: fields.last_modified.unwrap_or_default(),
            authors: fields.authors.into_iter().map(AuthorField::into_name).collect(),
            url: None,
        },
        data: non_empty(fields.data),
        attachment: first_url(fields.attachment),
    }
}

fn to_event(record: AirtableRecord<EventFields>) -> EventFull {
    let fields = record.fields;

    EventFull {
        preview: EventPreview {
            id: record.id,
            name: fields.name.unwrap_or_default(),
            summary: fields.summary.unwrap_or_default(),
            status: non_empty(fields.status)
                .map(EventStatus::from)
                .unwrap_or_default(),
            tags: fields.tags,
            date: fields.date.unwrap_or_default(),
            location_url: non_empty(fields.location_url),
            registration_url: non_empty(fields.registration_url),
            attachment_url: None,
        },
        attachment: first_url(fields.attachment),
    }
}

fn to_person(record: AirtableRecord<PersonFields>) -> Person {
    let fields = record.fields;
    let photo = [fields.photo, fields.attachment, fields.attachments]
        .into_iter()
        .find(|list| !list.is_empty())
        .and_then(first_url);

    Person {
        id: record.id,
        name: fields.name.unwrap_or_default(),
        tagline: fields.tagline.unwrap_or_default(),
        description: fields.description.unwrap_or_default(),
        email: fields.email.unwrap_or_default(),
        linkedin: fields.linkedin.unwrap_or_default(),
        attachment_url: photo,
    }
}

/// `DataSource` reading the Airtable base directly
#[derive(Clone)]
pub struct AirtableSource {
    client: reqwest::Client,
    base_url: Url,
    token: String,
    data_table: String,
    events_table: String,
    people_table: String,
    mailing_table: String,
}

impl AirtableSource {
    pub fn new(settings: &AirtableSettings, timeout_secs: u64) -> Result<Self> {
        let mut base_url = Url::parse(&settings.api_base).map_err(|e| {
            AppError::Settings(format!("Invalid Airtable URL {:?}: {}", settings.api_base, e))
        })?;
        base_url
            .path_segments_mut()
            .map_err(|_| {
                AppError::Settings(format!(
                    "Airtable URL cannot have paths: {}",
                    settings.api_base
                ))
            })?
            .pop_if_empty()
            .push(&settings.base_id);

        if settings.token.is_empty() {
            tracing::warn!("No Airtable token configured; requests will be rejected");
        }

        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url,
            token: settings.token.clone(),
            data_table: settings.data_table.clone(),
            events_table: settings.events_table.clone(),
            people_table: settings.people_table.clone(),
            mailing_table: settings.mailing_table.clone(),
        })
    }

    fn table_url(&self, table: &str, record_id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.push(table);
            if let Some(id) = record_id {
                path.push(id);
            }
        }
        url
    }

    async fn get(&self, url: Url, offset: Option<&str>) -> Result<reqwest::Response> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url).bearer_auth(&self.token);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Airtable returned status: {}", status);
            return Err(AppError::status(CONTEXT, status.as_u16()));
        }
        Ok(response)
    }

    /// Every record of `table`, across all pages
    async fn list<F>(&self, table: &str) -> Result<Vec<AirtableRecord<F>>>
    where
        F: DeserializeOwned + Default,
    {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let page: RecordPage = self
                .get(self.table_url(table, None), offset.as_deref())
                .await?
                .json()
                .await?;
            records.extend(list_or_empty::<AirtableRecord<F>>(page.records)?);

            match page.offset {
                Some(next) if offset.as_deref() != Some(next.as_str()) => offset = Some(next),
                _ => break,
            }
        }

        tracing::debug!("Read {} records from table {}", records.len(), table);
        Ok(records)
    }

    async fn record<F>(&self, table: &str, id: &str) -> Result<AirtableRecord<F>>
    where
        F: DeserializeOwned + Default,
    {
        Ok(self
            .get(self.table_url(table, Some(id)), None)
            .await?
            .json()
            .await?)
    }
}

#[async_trait]
impl DataSource for AirtableSource {
    async fn fetch_documents(&self) -> Result<Vec<DocumentPreview>> {
        let records = self.list::<DocumentFields>(&self.data_table).await?;
        let total = records.len();

        let documents: Vec<DocumentPreview> = records
            .into_iter()
            .map(|r| to_document(r).preview)
            .filter(|doc| doc.kind.is_known())
            .collect();

        if documents.len() < total {
            tracing::debug!("Dropped {} documents of unknown type", total - documents.len());
        }
        Ok(documents)
    }

    async fn fetch_document(&self, id: &str) -> Result<DocumentFull> {
        let record = self.record::<DocumentFields>(&self.data_table, id).await?;
        Ok(to_document(record))
    }

    async fn fetch_events(&self) -> Result<Vec<EventPreview>> {
        let records = self.list::<EventFields>(&self.events_table).await?;
        Ok(records.into_iter().map(|r| to_event(r).preview).collect())
    }

    async fn fetch_event(&self, id: &str) -> Result<EventFull> {
        let record = self.record::<EventFields>(&self.events_table, id).await?;
        Ok(to_event(record))
    }

    async fn fetch_people(&self) -> Result<Vec<Person>> {
        let records = self.list::<PersonFields>(&self.people_table).await?;
        Ok(records.into_iter().map(to_person).collect())
    }

    async fn fetch_person(&self, id: &str) -> Result<Person> {
        let record = self.record::<PersonFields>(&self.people_table, id).await?;
        Ok(to_person(record))
    }

    async fn subscribe_to_mailing_list(&self, email: &str) -> Result<()> {
        let url = self.table_url(&self.mailing_table, None);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "fields": { "email": email } }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::status("Failed to subscribe", status.as_u16()));
        }
        Ok(())
    }
}
