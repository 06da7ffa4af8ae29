//! CIMA data layer
//!
//! Client-side stores for the CIMA site: research documents with search,
//! type filters and highlights, an events calendar, the people directory
//! and the mailing list, over either the site backend or Airtable.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod source;
