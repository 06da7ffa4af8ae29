//! Commands exposed to the command line
//!
//! All commands follow the pattern:
//! - Take AppState as first parameter
//! - Return Result<T, AppError> with a serializable view
//! - Load the collection they read from before deriving anything

use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::models::{DataType, DocumentFull, DocumentPreview, EventFull, Person};
use crate::services::calendar::{to_ymd, CalendarCell};
use crate::services::deals::Highlights;
use crate::services::{LoadStatus, Loadable};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Serialize)]
pub struct AppInfo {
    pub version: String,
    pub source: String,
}

#[derive(Serialize)]
pub struct CalendarView {
    /// First day of the displayed month
    pub month: String,
    pub cells: Vec<CalendarCell>,
}

pub fn get_app_info(state: &AppState) -> AppInfo {
    AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        source: state.settings.source.as_str().to_string(),
    }
}

/// Surface a failed load as an error instead of an empty view
fn ensure_ready<T>(state: &Loadable<T>) -> Result<()> {
    match state.status {
        LoadStatus::Error => Err(AppError::Generic(
            state.error_message.clone().unwrap_or_default(),
        )),
        _ => Ok(()),
    }
}

// ===== Deals Commands =====

/// Documents matching `query` and `types`
pub async fn list_deals(
    state: &AppState,
    query: Option<String>,
    types: Vec<String>,
) -> Result<Vec<DocumentPreview>> {
    state.deals.ensure_loaded().await;
    ensure_ready(&state.deals.state())?;

    state.deals.set_query(query.unwrap_or_default());
    state.deals.clear_types();
    for kind in types {
        let kind = DataType::from(kind.trim().to_lowercase());
        if !state.deals.selected_types().contains(&kind) {
            state.deals.toggle_type(kind);
        }
    }

    Ok(state.deals.filtered())
}

pub async fn get_highlights(state: &AppState) -> Result<Highlights> {
    state.deals.ensure_loaded().await;
    ensure_ready(&state.deals.state())?;
    Ok(state.deals.highlights())
}

pub async fn get_document(state: &AppState, id: String) -> Result<DocumentFull> {
    state.deals.fetch_document(&id).await
}

// ===== Events Commands =====

/// Parse `YYYY-MM` into the first day of that month
pub fn parse_month(month: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .map_err(|_| AppError::Generic(format!("Invalid month {:?}, expected YYYY-MM", month)))
}

/// Month grid for `month` (`YYYY-MM`), or the current month
pub async fn get_calendar(state: &AppState, month: Option<String>) -> Result<CalendarView> {
    match month {
        Some(month) => state.events.set_month(parse_month(&month)?),
        None => state.events.this_month(),
    }

    state.events.ensure_loaded().await;
    ensure_ready(&state.events.state())?;

    Ok(CalendarView {
        month: to_ymd(state.events.current_month()),
        cells: state.events.month_grid(),
    })
}

pub async fn get_event(state: &AppState, id: String) -> Result<EventFull> {
    state.events.fetch_event(&id).await
}

// ===== People Commands =====

pub async fn list_people(state: &AppState) -> Result<Vec<Person>> {
    state.people.ensure_loaded().await;
    let people = state.people.state();
    ensure_ready(&people)?;
    Ok(people.items().to_vec())
}

pub async fn get_person(state: &AppState, id: String) -> Result<Person> {
    state.people.fetch_person(&id).await
}

// ===== Mailing Commands =====

pub async fn subscribe(state: &AppState, email: String) -> Result<()> {
    state.mailing.subscribe(&email).await
}
