//! Application configuration constants
//!
//! Central location for endpoints, table identifiers, view sizes and
//! fallback messages used throughout the data layer.

// ===== Backend =====

/// Default base URL of the site's own JSON API
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Environment variable overriding the backend base URL
pub const BACKEND_URL_ENV: &str = "CIMA_API_URL";

// ===== Airtable =====

/// Airtable REST API root
pub const AIRTABLE_API_BASE: &str = "https://api.airtable.com/v0";

/// Airtable base holding every CIMA table
pub const DEFAULT_AIRTABLE_BASE_ID: &str = "appDwuBzzUFQKZqrx";

/// Environment variable holding the Airtable personal access token
pub const AIRTABLE_TOKEN_ENV: &str = "AIRTABLE_CIMA_PAT";

pub const DATA_TABLE: &str = "tblhrPSM9atIrQquv";
pub const EVENTS_TABLE: &str = "tblz2kaxgRjPtr102";
pub const PEOPLE_TABLE: &str = "tblDzrBK7Mb7Zxe8o";
pub const MAILING_TABLE: &str = "tblSHOisjiHmIFd5P";

// ===== HTTP =====

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("cima-data/", env!("CARGO_PKG_VERSION"));

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Lower bound for a configured request timeout
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

/// Upper bound for a configured request timeout (5 minutes)
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

// ===== Derived views =====

/// Number of most recent documents kept per type in the highlights view
pub const HIGHLIGHTS_PER_TYPE: usize = 3;

// ===== Loader fallbacks =====

pub const DEALS_LOAD_ERROR: &str = "Failed to load deals";
pub const EVENTS_LOAD_ERROR: &str = "Failed to load events";
pub const PEOPLE_LOAD_ERROR: &str = "Failed to load people";

/// Message recorded when a load future is dropped before completing
pub const LOAD_CANCELLED: &str = "Load cancelled";

/// Settings file name inside the data directory
pub const SETTINGS_FILE: &str = "settings.json";
