//! Custom attribute writes

use std::collections::BTreeMap;

use crate::error::InventoryError;
use crate::inventory::{InventoryApi, SystemId};
use crate::session::Session;

/// Sets one custom attribute on one inventory record.
///
/// Each call is a plain overwrite of a single key, so repeating it with the
/// same value leaves the record unchanged.
pub struct AttributeSync<'a, I: ?Sized> {
    inventory: &'a I,
}

impl<'a, I: InventoryApi + ?Sized> AttributeSync<'a, I> {
    pub fn new(inventory: &'a I) -> Self {
        Self { inventory }
    }

    pub async fn apply(
        &self,
        session: &Session,
        system: SystemId,
        attribute_key: &str,
        value: &str,
    ) -> Result<(), InventoryError> {
        let values = BTreeMap::from([(attribute_key.to_string(), value.to_string())]);
        self.inventory
            .set_custom_values(session.key(), system, &values)
            .await
    }
}
