//! Satellite XML-RPC client
//!
//! Implements [`InventoryApi`] by POSTing XML-RPC calls to the platform's
//! `/rpc/api` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use super::xmlrpc::{self, Value};
use super::{InventoryApi, InventoryHost, SessionKey, SystemId};
use crate::config::InventoryConfig;
use crate::error::InventoryError;

pub struct SatelliteClient {
    http: Client,
    url: Url,
}

impl SatelliteClient {
    pub fn new(config: &InventoryConfig, timeout: Duration) -> Result<Self, InventoryError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Issue one XML-RPC call and decode its result
    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, InventoryError> {
        let body = xmlrpc::encode_call(method, params);
        // auth.* payloads carry the password or the session key
        let loggable = !method.starts_with("auth.");
        if loggable {
            tracing::trace!(method, request = %body, "XML-RPC request");
        }

        let response = self
            .http
            .post(self.url.clone())
            .header("Content-Type", "text/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InventoryError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let text = response.text().await?;
        if loggable {
            tracing::trace!(method, response = %text, "XML-RPC response");
        }
        xmlrpc::decode_response(&text)
    }
}

#[async_trait]
impl InventoryApi for SatelliteClient {
    async fn login(&self, username: &str, password: &str) -> Result<SessionKey, InventoryError> {
        let result = self
            .call("auth.login", &[username.into(), password.into()])
            .await?;
        result
            .as_str()
            .map(SessionKey::new)
            .ok_or_else(|| unexpected("auth.login", format!("got {}", result.kind())))
    }

    async fn logout(&self, session: &SessionKey) -> Result<(), InventoryError> {
        self.call("auth.logout", &[session.as_str().into()])
            .await
            .map(|_| ())
    }

    async fn search_by_name(
        &self,
        session: &SessionKey,
        query: &str,
    ) -> Result<Vec<InventoryHost>, InventoryError> {
        const METHOD: &str = "system.search.nameAndDescription";
        let result = self
            .call(METHOD, &[session.as_str().into(), query.into()])
            .await?;
        let rows = result
            .as_array()
            .ok_or_else(|| unexpected(METHOD, format!("got {}", result.kind())))?;
        rows.iter().map(|row| decode_host(METHOD, row)).collect()
    }

    async fn set_custom_values(
        &self,
        session: &SessionKey,
        system: SystemId,
        values: &BTreeMap<String, String>,
    ) -> Result<(), InventoryError> {
        self.call(
            "system.setCustomValues",
            &[session.as_str().into(), system.0.into(), values.into()],
        )
        .await
        .map(|_| ())
    }
}

/// Search rows are structs with at least `id` and `name`
pub(crate) fn decode_host(method: &str, row: &Value) -> Result<InventoryHost, InventoryError> {
    let members = row
        .as_struct()
        .ok_or_else(|| unexpected(method, format!("row is {}", row.kind())))?;

    let id = match members.get("id") {
        Some(Value::Int(id)) => SystemId(*id),
        Some(Value::String(id)) => id
            .trim()
            .parse()
            .map(SystemId)
            .map_err(|_| unexpected(method, format!("non-numeric system id '{}'", id)))?,
        _ => return Err(unexpected(method, "row has no id".to_string())),
    };
    let text = |field: &str| {
        members
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(InventoryHost {
        id,
        name: text("name"),
        hostname: text("hostname"),
    })
}

fn unexpected(method: &str, detail: String) -> InventoryError {
    InventoryError::UnexpectedResponse {
        method: method.to_string(),
        detail,
    }
}
