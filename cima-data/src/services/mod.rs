//! Services module
//!
//! Stores and services that sit between the data sources and the UI:
//! each owns its state and derives views from it on demand.

pub mod calendar;
pub mod deals;
pub mod events;
pub mod loader;
pub mod mailing;
pub mod people;
pub mod settings;

pub use deals::DealsService;
pub use events::EventsService;
pub use loader::{CollectionLoader, LoadStatus, Loadable};
pub use mailing::MailingService;
pub use people::PeopleService;
pub use settings::SettingsService;
