//! Inventory platform boundary
//!
//! [`InventoryApi`] is the narrow RPC surface factsync needs from the
//! systems-management platform. [`SatelliteClient`] speaks it over XML-RPC;
//! tests use in-memory implementations.

pub mod satellite;
pub mod xmlrpc;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::InventoryError;

pub use satellite::SatelliteClient;

/// Numeric system id assigned by the inventory platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(pub i64);

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate inventory record returned by a name search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryHost {
    pub id: SystemId,
    pub name: String,
    pub hostname: String,
}

/// Opaque session key returned by `auth.login`. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

/// Remote calls factsync makes against the inventory platform
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// `auth.login`
    async fn login(&self, username: &str, password: &str) -> Result<SessionKey, InventoryError>;

    /// `auth.logout`
    async fn logout(&self, session: &SessionKey) -> Result<(), InventoryError>;

    /// `system.search.nameAndDescription`
    async fn search_by_name(
        &self,
        session: &SessionKey,
        query: &str,
    ) -> Result<Vec<InventoryHost>, InventoryError>;

    /// `system.setCustomValues`. Keys not in `values` are left untouched.
    async fn set_custom_values(
        &self,
        session: &SessionKey,
        system: SystemId,
        values: &BTreeMap<String, String>,
    ) -> Result<(), InventoryError>;
}
