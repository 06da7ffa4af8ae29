//! Deals service
//!
//! Holds the document collection plus the search/type filter state and
//! derives the filtered list and the per-type highlights from them.

use crate::config::{DEALS_LOAD_ERROR, HIGHLIGHTS_PER_TYPE};
use crate::error::Result;
use crate::models::{DataType, DocumentFull, DocumentPreview};
use crate::services::loader::{CollectionLoader, LoadStatus, Loadable};
use crate::source::DataSource;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;

/// Search text and selected document types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealFilter {
    pub query: String,
    /// Empty means every type
    pub selected_types: BTreeSet<DataType>,
}

/// Most recent documents of each known type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Highlights {
    pub report: Vec<DocumentPreview>,
    pub flash: Vec<DocumentPreview>,
    pub fundamentals: Vec<DocumentPreview>,
}

impl Highlights {
    /// Bucket for `kind`, empty for types outside the known set
    pub fn bucket(&self, kind: &DataType) -> &[DocumentPreview] {
        match kind {
            DataType::Report => &self.report,
            DataType::Flash => &self.flash,
            DataType::Fundamentals => &self.fundamentals,
            DataType::Other(_) => &[],
        }
    }

    fn bucket_mut(&mut self, kind: &DataType) -> Option<&mut Vec<DocumentPreview>> {
        match kind {
            DataType::Report => Some(&mut self.report),
            DataType::Flash => Some(&mut self.flash),
            DataType::Fundamentals => Some(&mut self.fundamentals),
            DataType::Other(_) => None,
        }
    }

    /// Known types paired with their buckets, in display order
    pub fn iter(&self) -> impl Iterator<Item = (DataType, &[DocumentPreview])> + '_ {
        DataType::KNOWN.into_iter().map(move |kind| {
            let docs = self.bucket(&kind);
            (kind, docs)
        })
    }
}

/// Documents matching `filter`, in collection order
pub fn filter_documents(items: &[DocumentPreview], filter: &DealFilter) -> Vec<DocumentPreview> {
    let query = filter.query.trim().to_lowercase();
    let restrict_types = !filter.selected_types.is_empty();

    items
        .iter()
        .filter(|doc| {
            if restrict_types && !filter.selected_types.contains(&doc.kind) {
                return false;
            }
            if query.is_empty() {
                return true;
            }
            doc.name.to_lowercase().contains(&query)
                || doc.summary.to_lowercase().contains(&query)
                || doc.authors.join(" ").to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// Newest documents per known type, by `creation_time` descending
pub fn highlights(items: &[DocumentPreview]) -> Highlights {
    let mut result = Highlights::default();

    for doc in items {
        if let Some(bucket) = result.bucket_mut(&doc.kind) {
            bucket.push(doc.clone());
        }
    }

    for kind in DataType::KNOWN {
        if let Some(bucket) = result.bucket_mut(&kind) {
            // ISO-8601 strings order chronologically; empty sorts last
            bucket.sort_by(|a, b| b.creation_time.cmp(&a.creation_time));
            bucket.truncate(HIGHLIGHTS_PER_TYPE);
        }
    }

    result
}

/// Store for the deals/research documents page
pub struct DealsService {
    source: Arc<dyn DataSource>,
    loader: CollectionLoader<DocumentPreview>,
    filter: watch::Sender<DealFilter>,
}

impl DealsService {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        let (filter, _) = watch::channel(DealFilter::default());
        Self {
            source,
            loader: CollectionLoader::new(DEALS_LOAD_ERROR),
            filter,
        }
    }

    /// Fetch all document previews; no-op while a load is in flight
    pub async fn load(&self) {
        tracing::info!("Loading deals");
        let source = Arc::clone(&self.source);
        self.loader
            .load(|| async move { source.fetch_documents().await })
            .await;
    }

    /// Load unless documents were already loaded
    pub async fn ensure_loaded(&self) {
        let source = Arc::clone(&self.source);
        self.loader
            .ensure_loaded(|| async move { source.fetch_documents().await })
            .await;
    }

    /// Current collection state
    pub fn state(&self) -> Loadable<DocumentPreview> {
        self.loader.borrow().clone()
    }

    pub fn status(&self) -> LoadStatus {
        self.loader.status()
    }

    /// Receiver notified when the collection state changes
    pub fn subscribe(&self) -> watch::Receiver<Loadable<DocumentPreview>> {
        self.loader.subscribe()
    }

    /// Receiver notified when the query or type selection changes
    pub fn subscribe_filter(&self) -> watch::Receiver<DealFilter> {
        self.filter.subscribe()
    }

    pub fn query(&self) -> String {
        self.filter.borrow().query.clone()
    }

    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.filter.send_if_modified(|f| {
            if f.query == query {
                return false;
            }
            f.query = query;
            true
        });
    }

    pub fn selected_types(&self) -> BTreeSet<DataType> {
        self.filter.borrow().selected_types.clone()
    }

    /// Add `kind` to the selection if absent, remove it if present
    pub fn toggle_type(&self, kind: DataType) {
        self.filter.send_modify(|f| {
            let mut next = f.selected_types.clone();
            if !next.remove(&kind) {
                next.insert(kind);
            }
            f.selected_types = next;
        });
    }

    pub fn clear_types(&self) {
        self.filter.send_if_modified(|f| {
            if f.selected_types.is_empty() {
                return false;
            }
            f.selected_types = BTreeSet::new();
            true
        });
    }

    /// Documents matching the current query and type selection
    pub fn filtered(&self) -> Vec<DocumentPreview> {
        let state = self.loader.borrow();
        let filter = self.filter.borrow();
        filter_documents(state.items(), &filter)
    }

    /// Three newest documents per type, ignoring the filter state
    pub fn highlights(&self) -> Highlights {
        highlights(self.loader.borrow().items())
    }

    /// Full text and attachment link of one document
    pub async fn fetch_document(&self, id: &str) -> Result<DocumentFull> {
        tracing::debug!("Fetching document {}", id);
        self.source.fetch_document(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::MemorySource;

    fn doc(id: &str, kind: &str, created: &str) -> DocumentPreview {
        DocumentPreview {
            id: id.to_string(),
            name: format!("Document {}", id),
            summary: String::new(),
            kind: DataType::from(kind),
            creation_time: created.to_string(),
            last_modified: String::new(),
            authors: vec![],
            url: None,
        }
    }

    fn sample() -> Vec<DocumentPreview> {
        vec![
            DocumentPreview {
                name: "Copper Outlook".to_string(),
                summary: "Supply deficits ahead".to_string(),
                authors: vec!["Ada Lovelace".to_string(), "Grace Hopper".to_string()],
                ..doc("1", "report", "2024-01-10")
            },
            DocumentPreview {
                name: "Lithium flash".to_string(),
                summary: "Prices spike on SUPPLY news".to_string(),
                ..doc("2", "flash", "2024-02-01")
            },
            DocumentPreview {
                name: "Bank fundamentals".to_string(),
                authors: vec!["Alan Turing".to_string()],
                ..doc("3", "fundamentals", "2023-12-01")
            },
        ]
    }

    fn filter(query: &str, types: &[DataType]) -> DealFilter {
        DealFilter {
            query: query.to_string(),
            selected_types: types.iter().cloned().collect(),
        }
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let items = sample();
        assert_eq!(filter_documents(&items, &DealFilter::default()), items);
        assert_eq!(filter_documents(&items, &filter("   ", &[])), items);
    }

    #[test]
    fn test_query_matches_name_summary_and_authors_case_insensitively() {
        let items = sample();

        let by_name = filter_documents(&items, &filter("copper", &[]));
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "1");

        let by_summary = filter_documents(&items, &filter("  Supply ", &[]));
        let ids: Vec<&str> = by_summary.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);

        let by_author = filter_documents(&items, &filter("TURING", &[]));
        assert_eq!(by_author.len(), 1);
        assert_eq!(by_author[0].id, "3");

        // Authors are joined with single spaces before matching
        let across_authors = filter_documents(&items, &filter("lovelace grace", &[]));
        assert_eq!(across_authors.len(), 1);

        assert!(filter_documents(&items, &filter("uranium", &[])).is_empty());
    }

    #[test]
    fn test_single_type_selection_only_keeps_that_type() {
        let items = sample();

        let flashes = filter_documents(&items, &filter("", &[DataType::Flash]));

        assert!(!flashes.is_empty());
        assert!(flashes.iter().all(|d| d.kind == DataType::Flash));
    }

    #[test]
    fn test_type_and_query_combine() {
        let items = sample();

        let result = filter_documents(&items, &filter("supply", &[DataType::Report]));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "1");
    }

    #[test]
    fn test_highlights_keep_three_newest_per_type() {
        let items = vec![
            doc("r1", "report", "2024-01-01"),
            doc("r2", "report", "2024-04-01"),
            doc("r3", "report", "2024-02-01"),
            doc("r4", "report", "2024-03-01"),
            doc("f1", "flash", "2024-01-05"),
        ];

        let result = highlights(&items);

        let reports: Vec<&str> = result.report.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(reports, vec!["r2", "r4", "r3"]);
        assert_eq!(result.flash.len(), 1);
        assert!(result.fundamentals.is_empty());
    }

    #[test]
    fn test_highlights_rank_missing_creation_time_last() {
        let items = vec![
            doc("blank", "flash", ""),
            doc("old", "flash", "2020-01-01T00:00:00"),
            doc("new", "flash", "2024-06-01T12:00:00"),
        ];

        let result = highlights(&items);

        let ids: Vec<&str> = result.flash.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "blank"]);
    }

    #[test]
    fn test_highlights_drop_unknown_types() {
        let items = vec![doc("m1", "memo", "2024-01-01"), doc("r1", "report", "2024-01-01")];

        let result = highlights(&items);

        assert_eq!(result.report.len(), 1);
        assert_eq!(result.iter().map(|(_, docs)| docs.len()).sum::<usize>(), 1);
        assert!(result.bucket(&DataType::Other("memo".to_string())).is_empty());
    }

    #[test]
    fn test_highlights_buckets_sorted_and_bounded() {
        let items: Vec<DocumentPreview> = (0..20)
            .map(|i| {
                let kind = ["report", "flash", "fundamentals"][i % 3];
                doc(&i.to_string(), kind, &format!("2024-01-{:02}", (i * 7) % 28 + 1))
            })
            .collect();

        let result = highlights(&items);

        for (_, docs) in result.iter() {
            assert!(docs.len() <= HIGHLIGHTS_PER_TYPE);
            assert!(docs
                .windows(2)
                .all(|pair| pair[0].creation_time >= pair[1].creation_time));
        }
    }

    #[tokio::test]
    async fn test_toggle_type_is_its_own_inverse() {
        let service = DealsService::new(Arc::new(MemorySource::default()));

        service.toggle_type(DataType::Flash);
        assert!(service.selected_types().contains(&DataType::Flash));

        service.toggle_type(DataType::Flash);
        assert!(service.selected_types().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_type_notifies_filter_subscribers() {
        let service = DealsService::new(Arc::new(MemorySource::default()));
        let mut rx = service.subscribe_filter();

        service.toggle_type(DataType::Report);

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().selected_types.contains(&DataType::Report));
    }

    #[tokio::test]
    async fn test_service_derives_views_from_loaded_documents() {
        let source = MemorySource::default().with_documents(sample());
        let service = DealsService::new(Arc::new(source));

        assert!(service.filtered().is_empty());

        service.load().await;
        assert_eq!(service.status(), LoadStatus::Ready);
        assert_eq!(service.filtered().len(), 3);

        service.set_query("supply");
        service.toggle_type(DataType::Flash);
        let filtered = service.filtered();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "2");

        // Highlights ignore the filter state
        let highlights = service.highlights();
        assert_eq!(highlights.report.len(), 1);
        assert_eq!(highlights.fundamentals.len(), 1);

        service.clear_types();
        assert_eq!(service.filtered().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_empty_views() {
        let source = MemorySource::default().failing("Airtable API error: 500");
        let service = DealsService::new(Arc::new(source));

        service.load().await;

        let state = service.state();
        assert_eq!(state.status, LoadStatus::Error);
        assert_eq!(state.items, Some(vec![]));
        assert_eq!(state.error_message.as_deref(), Some("Airtable API error: 500"));
        assert!(service.filtered().is_empty());
        assert_eq!(service.highlights(), Highlights::default());
    }

    #[tokio::test]
    async fn test_fetch_document_delegates_to_source() {
        let source = MemorySource::default().with_documents(sample());
        let service = DealsService::new(Arc::new(source));

        let full = service.fetch_document("2").await.unwrap();
        assert_eq!(full.preview.name, "Lithium flash");

        assert!(service.fetch_document("missing").await.is_err());
    }
}
