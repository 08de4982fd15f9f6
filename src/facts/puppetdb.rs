//! PuppetDB facts endpoint client
//!
//! Reads the `/v2/facts` payload: a JSON array of
//! `{"certname": .., "name": .., "value": .., "environment": ..}` objects.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::{Fact, FactSource};
use crate::config::FactFeedConfig;
use crate::error::FactSourceError;
use crate::mapping::MappingRule;

/// Raw feed record. Fields are optional here so a missing field can be
/// reported against its record index.
#[derive(Debug, Deserialize)]
struct RawFact {
    certname: Option<String>,
    name: Option<String>,
    #[serde(default)]
    value: Value,
}

/// HTTP GET fact source
pub struct PuppetDbFactSource {
    http: Client,
    url: Url,
    query: Option<String>,
}

impl PuppetDbFactSource {
    pub fn new(config: &FactFeedConfig, timeout: Duration) -> Result<Self, FactSourceError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
            query: None,
        })
    }

    /// Restrict the fetch to the fact names in `rule`
    pub fn with_name_filter(mut self, rule: &MappingRule) -> Self {
        self.query = Some(name_filter_query(rule));
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl FactSource for PuppetDbFactSource {
    async fn fetch(&self) -> Result<Vec<Fact>, FactSourceError> {
        let mut request = self
            .http
            .get(self.url.clone())
            .header("Accept", "application/json");
        if let Some(ref query) = self.query {
            request = request.query(&[("query", query)]);
        }

        tracing::debug!(url = %self.url, filtered = self.query.is_some(), "Fetching facts");

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FactSourceError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        let facts = parse_facts(&body)?;
        tracing::info!(count = facts.len(), "Fetched facts");
        Ok(facts)
    }
}

/// Parse a facts payload, failing on the first incomplete record
pub fn parse_facts(payload: &str) -> Result<Vec<Fact>, FactSourceError> {
    let records: Vec<RawFact> = serde_json::from_str(payload)?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let host_id = raw.certname.ok_or(FactSourceError::MissingField {
                index,
                field: "certname",
            })?;
            let name = raw.name.ok_or(FactSourceError::MissingField {
                index,
                field: "name",
            })?;
            let value = render_value(raw.value).ok_or(FactSourceError::MissingField {
                index,
                field: "value",
            })?;
            Ok(Fact {
                host_id,
                name,
                value,
            })
        })
        .collect()
}

/// Facts are strings on the inventory side; scalars keep their JSON text
fn render_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        structured @ (Value::Array(_) | Value::Object(_)) => Some(structured.to_string()),
    }
}

/// PuppetDB query selecting only the named facts
fn name_filter_query(rule: &MappingRule) -> String {
    let mut clauses = vec![Value::from("or")];
    clauses.extend(
        rule.fact_names()
            .map(|name| serde_json::json!(["=", "name", name])),
    );
    Value::Array(clauses).to_string()
}
