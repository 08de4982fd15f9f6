//! Fact feed
//!
//! A [`FactSource`] yields the full fact set for one run. Any transport or
//! shape problem fails the whole batch; there is no partial fetch.

pub mod puppetdb;

use async_trait::async_trait;

use crate::error::FactSourceError;

pub use puppetdb::PuppetDbFactSource;

/// One observation about one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    /// Host identifier as known to the fact repository (the certname)
    pub host_id: String,
    pub name: String,
    pub value: String,
}

impl Fact {
    pub fn new(
        host_id: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            host_id: host_id.into(),
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Source of the fact set
#[async_trait]
pub trait FactSource: Send + Sync {
    /// Fetch every fact, in feed order
    async fn fetch(&self) -> Result<Vec<Fact>, FactSourceError>;
}
