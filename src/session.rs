//! Inventory session lifecycle
//!
//! [`SessionManager::acquire`] logs in once; [`SessionManager::release`]
//! takes the [`Session`] by value, so a session can be released at most
//! once and cannot be used afterwards. `Session` is not `Clone`.

use crate::config::Credentials;
use crate::error::InventoryError;
use crate::inventory::{InventoryApi, SessionKey};

/// An authenticated inventory session for one run
#[derive(Debug)]
#[must_use = "a session must be handed back to SessionManager::release"]
pub struct Session {
    key: SessionKey,
}

impl Session {
    pub fn key(&self) -> &SessionKey {
        &self.key
    }
}

pub struct SessionManager<'a, I: ?Sized> {
    inventory: &'a I,
    credentials: &'a Credentials,
}

impl<'a, I: InventoryApi + ?Sized> SessionManager<'a, I> {
    pub fn new(inventory: &'a I, credentials: &'a Credentials) -> Self {
        Self {
            inventory,
            credentials,
        }
    }

    /// Log in. Failure here is fatal for the run.
    pub async fn acquire(&self) -> Result<Session, InventoryError> {
        let key = self
            .inventory
            .login(&self.credentials.username, &self.credentials.password)
            .await?;
        tracing::debug!(user = %self.credentials.username, "Inventory session acquired");
        Ok(Session { key })
    }

    /// Log out, best effort. A failed logout is logged and otherwise ignored.
    pub async fn release(&self, session: Session) {
        match self.inventory.logout(&session.key).await {
            Ok(()) => tracing::debug!("Inventory session released"),
            Err(e) => tracing::warn!(error = %e, "Inventory logout failed"),
        }
    }
}
