//! Host identifier → inventory record resolution
//!
//! A name search can return any number of candidates. Only a single
//! candidate is safe to update; several candidates mean duplicate inventory
//! records and the fact is skipped rather than risk writing to the wrong
//! system.

use crate::error::InventoryError;
use crate::inventory::{InventoryApi, InventoryHost};
use crate::session::Session;

/// Outcome of resolving one host identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one candidate
    Resolved(InventoryHost),
    /// More than one candidate; never updated
    Ambiguous(Vec<InventoryHost>),
    /// No candidate
    Unresolved,
}

impl Resolution {
    /// Classify a raw candidate set
    pub fn from_candidates(mut candidates: Vec<InventoryHost>) -> Self {
        match candidates.len() {
            0 => Resolution::Unresolved,
            1 => Resolution::Resolved(candidates.remove(0)),
            _ => Resolution::Ambiguous(candidates),
        }
    }
}

/// Looks up inventory records by host identifier
pub struct HostResolver<'a, I: ?Sized> {
    inventory: &'a I,
}

impl<'a, I: InventoryApi + ?Sized> HostResolver<'a, I> {
    pub fn new(inventory: &'a I) -> Self {
        Self { inventory }
    }

    pub async fn resolve(
        &self,
        session: &Session,
        host_id: &str,
    ) -> Result<Resolution, InventoryError> {
        let candidates = self.inventory.search_by_name(session.key(), host_id).await?;
        tracing::debug!(host = %host_id, candidates = candidates.len(), "Searched inventory");
        Ok(Resolution::from_candidates(candidates))
    }
}
