//! Collection loader
//!
//! Shared async load pattern behind every store: at most one fetch in
//! flight, status published through a watch channel, and failures turned
//! into an error state rather than returned to the caller.

use crate::config::LOAD_CANCELLED;
use crate::error::Result;
use serde::Serialize;
use std::future::Future;
use tokio::sync::watch;

/// Status of a loadable collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Snapshot of a collection and its load state
#[derive(Debug, Clone, Serialize)]
pub struct Loadable<T> {
    /// `None` until the first load finishes
    pub items: Option<Vec<T>>,
    pub status: LoadStatus,
    pub error_message: Option<String>,
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Self {
            items: None,
            status: LoadStatus::Idle,
            error_message: None,
        }
    }
}

impl<T> Loadable<T> {
    /// Items as a slice, empty while absent
    pub fn items(&self) -> &[T] {
        self.items.as_deref().unwrap_or(&[])
    }
}

/// Idempotent-while-in-flight loader for one collection
pub struct CollectionLoader<T> {
    state: watch::Sender<Loadable<T>>,
    default_error: &'static str,
}

impl<T> CollectionLoader<T> {
    /// Create a loader whose failures fall back to `default_error`
    pub fn new(default_error: &'static str) -> Self {
        let (state, _) = watch::channel(Loadable::default());
        Self {
            state,
            default_error,
        }
    }

    /// Receiver notified on every state transition
    pub fn subscribe(&self) -> watch::Receiver<Loadable<T>> {
        self.state.subscribe()
    }

    /// Borrow the current state without cloning the items
    pub fn borrow(&self) -> watch::Ref<'_, Loadable<T>> {
        self.state.borrow()
    }

    pub fn status(&self) -> LoadStatus {
        self.state.borrow().status
    }

    /// Run `fetch` unless a load is already in flight.
    ///
    /// Never returns an error: the outcome lands in the published state.
    pub async fn load<F, Fut>(&self, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let started = self.state.send_if_modified(|s| {
            if s.status == LoadStatus::Loading {
                return false;
            }
            s.status = LoadStatus::Loading;
            s.error_message = None;
            true
        });

        if !started {
            tracing::debug!("Load already in flight, skipping");
            return;
        }

        let guard = LoadingGuard { state: &self.state };
        let outcome = fetch().await;
        guard.disarm();

        match outcome {
            Ok(items) => {
                tracing::info!("Loaded {} records", items.len());
                self.state.send_modify(|s| {
                    s.items = Some(items);
                    s.status = LoadStatus::Ready;
                    s.error_message = None;
                });
            }
            Err(e) => {
                let message = e.to_string();
                let message = if message.trim().is_empty() {
                    self.default_error.to_string()
                } else {
                    message
                };
                tracing::warn!("Load failed: {}", message);
                self.state.send_modify(|s| {
                    s.items = Some(Vec::new());
                    s.status = LoadStatus::Error;
                    s.error_message = Some(message);
                });
            }
        }
    }

    /// Load only if nothing has been loaded yet and no load is in flight
    pub async fn ensure_loaded<F, Fut>(&self, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if self.state.borrow().items.is_some() {
            return;
        }
        self.load(fetch).await;
    }
}

/// Moves a dropped in-flight load to the error state
struct LoadingGuard<'a, T> {
    state: &'a watch::Sender<Loadable<T>>,
}

impl<T> LoadingGuard<'_, T> {
    fn disarm(self) {
        std::mem::forget(self);
    }
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        tracing::warn!("Load dropped before completion");
        self.state.send_modify(|s| {
            s.items = Some(Vec::new());
            s.status = LoadStatus::Error;
            s.error_message = Some(LOAD_CANCELLED.to_string());
        });
    }
}
