//! Cart tables - aggregates, owner uniqueness index, audit events

use super::{CART_EVENTS, CART_OWNER_INDEX, CARTS, EngineStorage, StorageError, StorageResult};
use redb::{ReadableTable, WriteTransaction};
use shared::cart::{CartEvent, CartSnapshot};

/// Load a cart inside a write transaction
pub fn load_cart(txn: &WriteTransaction, cart_id: &str) -> StorageResult<Option<CartSnapshot>> {
    let table = txn.open_table(CARTS)?;
    let cart = match table.get(cart_id)? {
        Some(guard) => Some(serde_json::from_slice(guard.value())?),
        None => None,
    };
    Ok(cart)
}

/// Load a cart inside a write transaction, erroring when absent
pub fn require_cart(txn: &WriteTransaction, cart_id: &str) -> StorageResult<CartSnapshot> {
    load_cart(txn, cart_id)?.ok_or_else(|| StorageError::CartNotFound(cart_id.to_string()))
}

/// Store a cart inside a write transaction
pub fn store_cart(txn: &WriteTransaction, cart: &CartSnapshot) -> StorageResult<()> {
    let bytes = serde_json::to_vec(cart)?;
    let mut table = txn.open_table(CARTS)?;
    table.insert(cart.cart_id.as_str(), bytes.as_slice())?;
    Ok(())
}

/// Point the owner index at a cart (the one-active-cart rule)
pub fn set_owner_index(txn: &WriteTransaction, owner_key: &str, cart_id: &str) -> StorageResult<()> {
    let mut table = txn.open_table(CART_OWNER_INDEX)?;
    table.insert(owner_key, cart_id)?;
    Ok(())
}

/// Drop the owner index entry (cart left the active state)
pub fn clear_owner_index(txn: &WriteTransaction, owner_key: &str) -> StorageResult<()> {
    let mut table = txn.open_table(CART_OWNER_INDEX)?;
    table.remove(owner_key)?;
    Ok(())
}

/// Append a cart audit event
pub fn append_cart_event(txn: &WriteTransaction, event: &CartEvent) -> StorageResult<()> {
    let bytes = serde_json::to_vec(event)?;
    let mut table = txn.open_table(CART_EVENTS)?;
    table.insert((event.cart_id.as_str(), event.sequence), bytes.as_slice())?;
    Ok(())
}

impl EngineStorage {
    /// Read a cart
    pub fn get_cart(&self, cart_id: &str) -> StorageResult<Option<CartSnapshot>> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(CARTS)?;
        let cart = match table.get(cart_id)? {
            Some(guard) => Some(serde_json::from_slice(guard.value())?),
            None => None,
        };
        Ok(cart)
    }

    /// Resolve the active cart id for an owner key
    pub fn get_active_cart_id(&self, owner_key: &str) -> StorageResult<Option<String>> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(CART_OWNER_INDEX)?;
        Ok(table.get(owner_key)?.map(|g| g.value().to_string()))
    }

    /// Read a cart's audit trail in sequence order
    pub fn get_cart_events(&self, cart_id: &str) -> StorageResult<Vec<CartEvent>> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(CART_EVENTS)?;
        let mut events = Vec::new();
        for item in table.range((cart_id, 0u64)..=(cart_id, u64::MAX))? {
            let (_, value) = item?;
            events.push(serde_json::from_slice(value.value())?);
        }
        Ok(events)
    }

    /// All cart ids (expiry sweep)
    pub fn get_all_cart_ids(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(CARTS)?;
        let mut ids = Vec::new();
        for item in table.iter()? {
            let (key, _) = item?;
            ids.push(key.value().to_string());
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::cart::{CartEventType, CartOwner};

    fn owner() -> CartOwner {
        CartOwner::Device {
            device_id: "dev-1".into(),
        }
    }

    #[test]
    fn cart_and_index_roundtrip() {
        let storage = EngineStorage::open_in_memory().unwrap();
        let cart = CartSnapshot::new("cart-1".into(), owner(), "USD".into());

        let txn = storage.begin_write().unwrap();
        store_cart(&txn, &cart).unwrap();
        set_owner_index(&txn, &cart.owner.key(), &cart.cart_id).unwrap();
        txn.commit().unwrap();

        assert_eq!(
            storage.get_active_cart_id(&owner().key()).unwrap().as_deref(),
            Some("cart-1")
        );
        assert!(storage.get_cart("cart-1").unwrap().is_some());

        let txn = storage.begin_write().unwrap();
        clear_owner_index(&txn, &owner().key()).unwrap();
        txn.commit().unwrap();
        assert!(storage.get_active_cart_id(&owner().key()).unwrap().is_none());
    }

    #[test]
    fn cart_events_append_in_order() {
        let storage = EngineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        for seq in 1..=2u64 {
            let event = CartEvent::new(
                "cart-1".into(),
                seq,
                CartEventType::ItemAdded,
                serde_json::json!({"listing_id": "l1"}),
                None,
            );
            append_cart_event(&txn, &event).unwrap();
        }
        txn.commit().unwrap();

        let events = storage.get_cart_events("cart-1").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 1);
    }
}
