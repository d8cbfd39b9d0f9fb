//! Inventory tables - records, ledger log, per-cart reservations
//!
//! Mutation helpers take a caller-supplied [`WriteTransaction`] so the
//! ledger can compose them into single atomic check-then-write units and so
//! checkout/payment can join inventory effects with their own writes.

use super::{
    EngineStorage, INVENTORY_RECORDS, INVENTORY_SEQUENCES, INVENTORY_TRANSACTIONS, RESERVATIONS,
    StorageResult,
};
use redb::{ReadableTable, WriteTransaction};
use shared::inventory::{InventoryRecord, InventoryTransaction};

/// Load an inventory record inside a write transaction
pub fn load_inventory_record(
    txn: &WriteTransaction,
    listing_id: &str,
) -> StorageResult<Option<InventoryRecord>> {
    let table = txn.open_table(INVENTORY_RECORDS)?;
    let record = match table.get(listing_id)? {
        Some(guard) => Some(serde_json::from_slice(guard.value())?),
        None => None,
    };
    Ok(record)
}

/// Store an inventory record inside a write transaction
pub fn store_inventory_record(
    txn: &WriteTransaction,
    record: &InventoryRecord,
) -> StorageResult<()> {
    let bytes = serde_json::to_vec(record)?;
    let mut table = txn.open_table(INVENTORY_RECORDS)?;
    table.insert(record.listing_id.as_str(), bytes.as_slice())?;
    Ok(())
}

/// Allocate the next per-listing ledger sequence
pub fn next_inventory_sequence(txn: &WriteTransaction, listing_id: &str) -> StorageResult<u64> {
    let mut table = txn.open_table(INVENTORY_SEQUENCES)?;
    let current = table.get(listing_id)?.map(|g| g.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(listing_id, next)?;
    Ok(next)
}

/// Append a ledger entry (append-only; sequence must come from
/// [`next_inventory_sequence`])
pub fn append_inventory_transaction(
    txn: &WriteTransaction,
    entry: &InventoryTransaction,
) -> StorageResult<()> {
    let bytes = serde_json::to_vec(entry)?;
    let mut table = txn.open_table(INVENTORY_TRANSACTIONS)?;
    table.insert((entry.listing_id.as_str(), entry.sequence), bytes.as_slice())?;
    Ok(())
}

/// Reserved quantity held by a cart for a listing
pub fn reservation_for(
    txn: &WriteTransaction,
    listing_id: &str,
    cart_id: &str,
) -> StorageResult<i64> {
    let table = txn.open_table(RESERVATIONS)?;
    Ok(table.get((listing_id, cart_id))?.map(|g| g.value()).unwrap_or(0))
}

/// Set (or clear, at zero) a cart's hold on a listing
pub fn set_reservation(
    txn: &WriteTransaction,
    listing_id: &str,
    cart_id: &str,
    quantity: i64,
) -> StorageResult<()> {
    let mut table = txn.open_table(RESERVATIONS)?;
    if quantity <= 0 {
        table.remove((listing_id, cart_id))?;
    } else {
        table.insert((listing_id, cart_id), quantity)?;
    }
    Ok(())
}

impl EngineStorage {
    /// Read a single inventory record
    pub fn get_inventory_record(&self, listing_id: &str) -> StorageResult<Option<InventoryRecord>> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(INVENTORY_RECORDS)?;
        let record = match table.get(listing_id)? {
            Some(guard) => Some(serde_json::from_slice(guard.value())?),
            None => None,
        };
        Ok(record)
    }

    /// Read the full ledger log for a listing, in sequence order
    pub fn get_inventory_transactions(
        &self,
        listing_id: &str,
    ) -> StorageResult<Vec<InventoryTransaction>> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(INVENTORY_TRANSACTIONS)?;
        let mut entries = Vec::new();
        for item in table.range((listing_id, 0u64)..=(listing_id, u64::MAX))? {
            let (_, value) = item?;
            entries.push(serde_json::from_slice(value.value())?);
        }
        Ok(entries)
    }

    /// Read a cart's hold on a listing
    pub fn get_reservation(&self, listing_id: &str, cart_id: &str) -> StorageResult<i64> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(RESERVATIONS)?;
        Ok(table.get((listing_id, cart_id))?.map(|g| g.value()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::inventory::InventoryTransactionType;

    #[test]
    fn record_roundtrip() {
        let storage = EngineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut record = InventoryRecord::new("listing-1".into());
        record.quantity_available = 7;
        store_inventory_record(&txn, &record).unwrap();
        txn.commit().unwrap();

        let loaded = storage.get_inventory_record("listing-1").unwrap().unwrap();
        assert_eq!(loaded.quantity_available, 7);
        assert!(storage.get_inventory_record("missing").unwrap().is_none());
    }

    #[test]
    fn transactions_scan_in_order() {
        let storage = EngineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        for _ in 0..3 {
            let seq = next_inventory_sequence(&txn, "listing-1").unwrap();
            let entry = InventoryTransaction::new(
                "listing-1".into(),
                seq,
                -1,
                InventoryTransactionType::Reservation,
            );
            append_inventory_transaction(&txn, &entry).unwrap();
        }
        // Another listing must not leak into the scan
        let seq = next_inventory_sequence(&txn, "listing-2").unwrap();
        let other = InventoryTransaction::new(
            "listing-2".into(),
            seq,
            5,
            InventoryTransactionType::Restock,
        );
        append_inventory_transaction(&txn, &other).unwrap();
        txn.commit().unwrap();

        let entries = storage.get_inventory_transactions("listing-1").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn reservation_cleared_at_zero() {
        let storage = EngineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        set_reservation(&txn, "listing-1", "cart-1", 4).unwrap();
        txn.commit().unwrap();
        assert_eq!(storage.get_reservation("listing-1", "cart-1").unwrap(), 4);

        let txn = storage.begin_write().unwrap();
        set_reservation(&txn, "listing-1", "cart-1", 0).unwrap();
        txn.commit().unwrap();
        assert_eq!(storage.get_reservation("listing-1", "cart-1").unwrap(), 0);
    }
}
