//! Events service
//!
//! Holds the event collection and the month shown by the calendar, and
//! derives the per-day buckets and the month grid from them.

use crate::config::EVENTS_LOAD_ERROR;
use crate::error::Result;
use crate::models::{EventFull, EventPreview};
use crate::services::calendar::{self, CalendarCell, DayBuckets};
use crate::services::loader::{CollectionLoader, LoadStatus, Loadable};
use crate::source::DataSource;
use chrono::{Local, NaiveDate, TimeZone};
use std::sync::Arc;
use tokio::sync::watch;

/// Store for the events list and calendar pages
pub struct EventsService {
    source: Arc<dyn DataSource>,
    loader: CollectionLoader<EventPreview>,
    /// Always the first day of the displayed month
    month: watch::Sender<NaiveDate>,
}

impl EventsService {
    /// Store showing the current local month
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self::with_month(source, Local::now().date_naive())
    }

    /// Store showing the month containing `date`
    pub fn with_month(source: Arc<dyn DataSource>, date: NaiveDate) -> Self {
        let (month, _) = watch::channel(calendar::month_start(date));
        Self {
            source,
            loader: CollectionLoader::new(EVENTS_LOAD_ERROR),
            month,
        }
    }

    /// Fetch all event previews; no-op while a load is in flight
    pub async fn load(&self) {
        tracing::info!("Loading events");
        let source = Arc::clone(&self.source);
        self.loader
            .load(|| async move { source.fetch_events().await })
            .await;
    }

    /// Load unless events were already loaded
    pub async fn ensure_loaded(&self) {
        let source = Arc::clone(&self.source);
        self.loader
            .ensure_loaded(|| async move { source.fetch_events().await })
            .await;
    }

    pub fn state(&self) -> Loadable<EventPreview> {
        self.loader.borrow().clone()
    }

    pub fn status(&self) -> LoadStatus {
        self.loader.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<Loadable<EventPreview>> {
        self.loader.subscribe()
    }

    /// Receiver notified when the displayed month changes
    pub fn subscribe_month(&self) -> watch::Receiver<NaiveDate> {
        self.month.subscribe()
    }

    /// First day of the displayed month
    pub fn current_month(&self) -> NaiveDate {
        *self.month.borrow()
    }

    /// Show the month containing `date`
    pub fn set_month(&self, date: NaiveDate) {
        let start = calendar::month_start(date);
        self.month.send_if_modified(|m| {
            if *m == start {
                return false;
            }
            *m = start;
            true
        });
    }

    pub fn prev_month(&self) {
        self.set_month(calendar::add_months(self.current_month(), -1));
    }

    pub fn next_month(&self) {
        self.set_month(calendar::add_months(self.current_month(), 1));
    }

    /// Jump back to the current local month
    pub fn this_month(&self) {
        self.set_month(Local::now().date_naive());
    }

    /// Loaded events grouped by local calendar day
    pub fn events_by_day(&self) -> DayBuckets {
        calendar::bucket_by_day(self.loader.borrow().items())
    }

    /// Loaded events grouped by calendar day in `tz`
    pub fn events_by_day_in<Tz: TimeZone>(&self, tz: &Tz) -> DayBuckets {
        calendar::bucket_by_day_in(self.loader.borrow().items(), tz)
    }

    /// Whole-week grid of the displayed month
    pub fn month_grid(&self) -> Vec<CalendarCell> {
        calendar::month_grid(self.current_month(), &self.events_by_day())
    }

    /// Month grid with days taken in `tz`
    pub fn month_grid_in<Tz: TimeZone>(&self, tz: &Tz) -> Vec<CalendarCell> {
        calendar::month_grid(self.current_month(), &self.events_by_day_in(tz))
    }

    /// One event with its attachment link
    pub async fn fetch_event(&self, id: &str) -> Result<EventFull> {
        tracing::debug!("Fetching event {}", id);
        self.source.fetch_event(id).await
    }
}
