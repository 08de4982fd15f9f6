//! Error types for factsync
//!
//! One enum per boundary. Only [`SyncError`] is fatal for a run; the
//! per-fact failures surface as [`InventoryError`] and are absorbed by the
//! orchestrator loop.

use thiserror::Error;

/// Fatal errors that end a reconciliation run
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Inventory login rejected: {0}")]
    Auth(#[source] InventoryError),

    #[error("Fact feed unavailable: {0}")]
    Fetch(#[from] FactSourceError),
}

/// Errors from fetching or parsing the fact feed
#[derive(Error, Debug)]
pub enum FactSourceError {
    #[error("Fact feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Fact feed returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Fact feed payload is not a fact array: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Fact record {index} has no '{field}'")]
    MissingField { index: usize, field: &'static str },
}

/// Errors from calls against the inventory platform
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Inventory request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Inventory endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed XML-RPC payload: {0}")]
    Xml(String),

    #[error("XML-RPC fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("Unexpected response to {method}: {detail}")]
    UnexpectedResponse { method: String, detail: String },
}

impl From<quick_xml::Error> for InventoryError {
    fn from(error: quick_xml::Error) -> Self {
        InventoryError::Xml(error.to_string())
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing required setting '{setting}' (set it in the config file or via {env})")]
    Missing {
        setting: &'static str,
        env: &'static str,
    },

    #[error("Invalid URL for '{setting}': {source}")]
    InvalidUrl {
        setting: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("http_timeout_secs must be at least 1")]
    InvalidTimeout,

    #[error("Invalid fact mapping: {0}")]
    InvalidMapping(String),
}
