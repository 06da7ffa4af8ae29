//! Command line interface definition

use crate::services::settings::SourceKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cima-data")]
#[command(about = "Query CIMA research documents, events and people")]
#[command(version)]
pub struct Cli {
    /// Directory holding settings.json (defaults to the platform data dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Override the configured data source
    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SourceArg {
    Backend,
    Airtable,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Backend => SourceKind::Backend,
            SourceArg::Airtable => SourceKind::Airtable,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show version and active source
    Info,
    /// List documents, optionally filtered
    Deals {
        /// Case-insensitive search over name, summary and authors
        #[arg(long)]
        query: Option<String>,
        /// Restrict to a document type (repeatable)
        #[arg(long = "type")]
        types: Vec<String>,
    },
    /// Three newest documents per type
    Highlights,
    /// Full text and attachment of one document
    Document { id: String },
    /// Month grid of events
    Calendar {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },
    /// One event with its attachment
    Event { id: String },
    /// The people directory
    People,
    /// One person of the directory
    Person { id: String },
    /// Add an address to the mailing list
    Subscribe { email: String },
}
