//! Order tables - event stream, snapshot cache, idempotency, coupon usage

use super::{
    COUPON_USAGE, EngineStorage, ORDER_EVENTS, ORDER_SNAPSHOTS, PROCESSED_COMMANDS, StorageError,
    StorageResult,
};
use redb::{ReadableTable, WriteTransaction};
use shared::order::{OrderEvent, OrderSnapshot};

/// Append an order event (append-only)
pub fn store_order_event(txn: &WriteTransaction, event: &OrderEvent) -> StorageResult<()> {
    let bytes = serde_json::to_vec(event)?;
    let mut table = txn.open_table(ORDER_EVENTS)?;
    table.insert((event.order_id.as_str(), event.sequence), bytes.as_slice())?;
    Ok(())
}

/// Store (replace) an order snapshot
pub fn store_order_snapshot(txn: &WriteTransaction, snapshot: &OrderSnapshot) -> StorageResult<()> {
    let bytes = serde_json::to_vec(snapshot)?;
    let mut table = txn.open_table(ORDER_SNAPSHOTS)?;
    table.insert(snapshot.order_id.as_str(), bytes.as_slice())?;
    Ok(())
}

/// Load an order snapshot inside a write transaction
pub fn load_order_snapshot(
    txn: &WriteTransaction,
    order_id: &str,
) -> StorageResult<Option<OrderSnapshot>> {
    let table = txn.open_table(ORDER_SNAPSHOTS)?;
    let snapshot = match table.get(order_id)? {
        Some(guard) => Some(serde_json::from_slice(guard.value())?),
        None => None,
    };
    Ok(snapshot)
}

/// Load an order snapshot, erroring when absent
pub fn require_order_snapshot(
    txn: &WriteTransaction,
    order_id: &str,
) -> StorageResult<OrderSnapshot> {
    load_order_snapshot(txn, order_id)?
        .ok_or_else(|| StorageError::OrderNotFound(order_id.to_string()))
}

/// Mark a command as processed (idempotency)
pub fn mark_command_processed(txn: &WriteTransaction, command_id: &str) -> StorageResult<()> {
    let mut table = txn.open_table(PROCESSED_COMMANDS)?;
    table.insert(command_id, ())?;
    Ok(())
}

/// Read a coupon's usage count for an account inside a write transaction
pub fn coupon_usage_count(
    txn: &WriteTransaction,
    coupon_id: &str,
    account_key: &str,
) -> StorageResult<u32> {
    let table = txn.open_table(COUPON_USAGE)?;
    Ok(table.get((coupon_id, account_key))?.map(|g| g.value()).unwrap_or(0))
}

/// Increment a coupon's usage count for an account (called at checkout)
pub fn increment_coupon_usage(
    txn: &WriteTransaction,
    coupon_id: &str,
    account_key: &str,
) -> StorageResult<u32> {
    let mut table = txn.open_table(COUPON_USAGE)?;
    let next = table.get((coupon_id, account_key))?.map(|g| g.value()).unwrap_or(0) + 1;
    table.insert((coupon_id, account_key), next)?;
    Ok(next)
}

impl EngineStorage {
    /// Check whether a command id has already been processed
    pub fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Read an order snapshot
    pub fn get_order_snapshot(&self, order_id: &str) -> StorageResult<Option<OrderSnapshot>> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(ORDER_SNAPSHOTS)?;
        let snapshot = match table.get(order_id)? {
            Some(guard) => Some(serde_json::from_slice(guard.value())?),
            None => None,
        };
        Ok(snapshot)
    }

    /// Read an order's event stream in sequence order
    pub fn get_order_events(&self, order_id: &str) -> StorageResult<Vec<OrderEvent>> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(ORDER_EVENTS)?;
        let mut events = Vec::new();
        for item in table.range((order_id, 0u64)..=(order_id, u64::MAX))? {
            let (_, value) = item?;
            events.push(serde_json::from_slice(value.value())?);
        }
        Ok(events)
    }

    /// All order ids (verify pass)
    pub fn get_all_order_ids(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(ORDER_SNAPSHOTS)?;
        let mut ids = Vec::new();
        for item in table.iter()? {
            let (key, _) = item?;
            ids.push(key.value().to_string());
        }
        Ok(ids)
    }

    /// Read a coupon's usage count for an account
    pub fn get_coupon_usage(&self, coupon_id: &str, account_key: &str) -> StorageResult<u32> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(COUPON_USAGE)?;
        Ok(table.get((coupon_id, account_key))?.map(|g| g.value()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotency_roundtrip() {
        let storage = EngineStorage::open_in_memory().unwrap();
        assert!(!storage.is_command_processed("cmd-1").unwrap());

        let txn = storage.begin_write().unwrap();
        mark_command_processed(&txn, "cmd-1").unwrap();
        txn.commit().unwrap();

        assert!(storage.is_command_processed("cmd-1").unwrap());
    }

    #[test]
    fn coupon_usage_counts() {
        let storage = EngineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        assert_eq!(coupon_usage_count(&txn, "c1", "acc-1").unwrap(), 0);
        assert_eq!(increment_coupon_usage(&txn, "c1", "acc-1").unwrap(), 1);
        assert_eq!(increment_coupon_usage(&txn, "c1", "acc-1").unwrap(), 2);
        txn.commit().unwrap();
        assert_eq!(storage.get_coupon_usage("c1", "acc-1").unwrap(), 2);
        assert_eq!(storage.get_coupon_usage("c1", "acc-2").unwrap(), 0);
    }

    #[test]
    fn snapshot_roundtrip() {
        let storage = EngineStorage::open_in_memory().unwrap();
        let snapshot = OrderSnapshot::new("order-1".into());
        let txn = storage.begin_write().unwrap();
        store_order_snapshot(&txn, &snapshot).unwrap();
        txn.commit().unwrap();

        let loaded = storage.get_order_snapshot("order-1").unwrap().unwrap();
        assert_eq!(loaded.order_id, "order-1");
        assert_eq!(storage.get_all_order_ids().unwrap(), vec!["order-1"]);
    }
}
