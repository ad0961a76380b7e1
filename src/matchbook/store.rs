//! Resting-order side store: contract and implementations.
//!
//! The store is an observer index the engine keeps in sync as resting
//! orders appear, shrink, and vanish. It never participates in matching
//! decisions, and the book works identically with no store attached. A
//! deployment may put a persistent KV store behind this trait; the crate
//! ships an in-memory index and a channel-backed wrapper that keeps the
//! engine from ever blocking on the store.

use crate::matchbook::types::{OrderKind, Side};
use crossbeam::channel::{Sender, unbounded};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::trace;

/// A resting order as recorded in the side store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOrder {
    /// Identifier of the originating order.
    pub id: u64,
    /// Fingerprint of the traded symbol.
    pub symbol_fp: u32,
    /// Side the order rests on.
    pub side: Side,
    /// Pricing mode of the originating order.
    pub kind: OrderKind,
    /// Price the order rests at.
    pub price: u64,
    /// Remaining quantity.
    pub quantity: u64,
    /// Nanosecond timestamp of the originating order.
    pub timestamp: u64,
}

/// The side-store contract the engine drives.
///
/// Implementations must be cheap enough to call from the matching path or
/// must defer work internally; the engine never waits on them.
pub trait RestingOrderStore: Send + Sync {
    /// Record a resting order. Silently ignores `id == 0`; idempotent on a
    /// duplicate id (the first record wins).
    fn add(&self, order: StoredOrder);

    /// Update the remaining quantity of a record. A zero quantity behaves
    /// as [`RestingOrderStore::remove`].
    fn update_quantity(&self, id: u64, new_quantity: u64);

    /// Drop a record, returning it when the implementation can do so
    /// synchronously.
    fn remove(&self, id: u64) -> Option<StoredOrder>;
}

/// In-memory store backed by a concurrent map.
///
/// Readable from any thread while the engine writes.
#[derive(Debug, Default)]
pub struct InMemoryRestingStore {
    orders: DashMap<u64, StoredOrder>,
}

impl InMemoryRestingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a record by order id.
    pub fn get(&self, id: u64) -> Option<StoredOrder> {
        self.orders.get(&id).map(|entry| *entry.value())
    }

    /// Number of resting records.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl RestingOrderStore for InMemoryRestingStore {
    fn add(&self, order: StoredOrder) {
        if order.id == 0 {
            return;
        }
        self.orders.entry(order.id).or_insert(order);
    }

    fn update_quantity(&self, id: u64, new_quantity: u64) {
        if new_quantity == 0 {
            self.orders.remove(&id);
            return;
        }
        if let Some(mut entry) = self.orders.get_mut(&id) {
            entry.quantity = new_quantity;
        }
    }

    fn remove(&self, id: u64) -> Option<StoredOrder> {
        self.orders.remove(&id).map(|(_, order)| order)
    }
}

/// A store operation carried over the worker channel.
enum StoreOp {
    Add(StoredOrder),
    UpdateQuantity { id: u64, quantity: u64 },
    Remove { id: u64 },
}

/// Channel-backed store wrapper.
///
/// Operations are forwarded over an unbounded channel to a worker thread
/// that applies them to an [`InMemoryRestingStore`], so the matching path
/// pays one channel send per store update and never blocks. Because the
/// application is deferred, [`RestingOrderStore::remove`] always returns
/// `None` here; use the inner store for synchronous queries.
pub struct ChannelRestingStore {
    sender: Option<Sender<StoreOp>>,
    inner: Arc<InMemoryRestingStore>,
    worker: Option<JoinHandle<()>>,
}

impl ChannelRestingStore {
    /// Spawn the worker and return the wrapper.
    pub fn spawn() -> Self {
        let inner = Arc::new(InMemoryRestingStore::new());
        let (sender, receiver) = unbounded::<StoreOp>();
        let applied = inner.clone();

        let worker = std::thread::spawn(move || {
            while let Ok(op) = receiver.recv() {
                match op {
                    StoreOp::Add(order) => applied.add(order),
                    StoreOp::UpdateQuantity { id, quantity } => {
                        applied.update_quantity(id, quantity);
                    }
                    StoreOp::Remove { id } => {
                        applied.remove(id);
                    }
                }
            }
            trace!("resting store worker drained and stopped");
        });

        Self {
            sender: Some(sender),
            inner,
            worker: Some(worker),
        }
    }

    /// The store the worker applies operations to.
    ///
    /// Reads lag in-flight operations by at most the channel depth.
    pub fn inner(&self) -> &Arc<InMemoryRestingStore> {
        &self.inner
    }

    /// Close the channel and wait for the worker to drain it.
    pub fn shutdown(mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    fn send(&self, op: StoreOp) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(op);
        }
    }
}

impl RestingOrderStore for ChannelRestingStore {
    fn add(&self, order: StoredOrder) {
        if order.id == 0 {
            return;
        }
        self.send(StoreOp::Add(order));
    }

    fn update_quantity(&self, id: u64, new_quantity: u64) {
        self.send(StoreOp::UpdateQuantity {
            id,
            quantity: new_quantity,
        });
    }

    fn remove(&self, id: u64) -> Option<StoredOrder> {
        self.send(StoreOp::Remove { id });
        None
    }
}

impl Drop for ChannelRestingStore {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchbook::types::symbol_fingerprint;

    fn stored(id: u64, quantity: u64) -> StoredOrder {
        StoredOrder {
            id,
            symbol_fp: symbol_fingerprint("BTC-USD"),
            side: Side::Sell,
            kind: OrderKind::Limit,
            price: 50_000,
            quantity,
            timestamp: 1,
        }
    }

    #[test]
    fn test_add_is_idempotent_and_ignores_zero_id() {
        let store = InMemoryRestingStore::new();
        store.add(stored(0, 5));
        assert!(store.is_empty());

        store.add(stored(1, 5));
        store.add(stored(1, 99));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).map(|o| o.quantity), Some(5));
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let store = InMemoryRestingStore::new();
        store.add(stored(1, 5));

        store.update_quantity(1, 3);
        assert_eq!(store.get(1).map(|o| o.quantity), Some(3));

        store.update_quantity(1, 0);
        assert!(store.get(1).is_none());
    }

    #[test]
    fn test_remove_returns_record() {
        let store = InMemoryRestingStore::new();
        store.add(stored(7, 2));

        let removed = store.remove(7);
        assert_eq!(removed.map(|o| o.id), Some(7));
        assert!(store.remove(7).is_none());
    }

    #[test]
    fn test_channel_store_applies_after_shutdown() {
        let store = ChannelRestingStore::spawn();
        store.add(stored(1, 10));
        store.update_quantity(1, 4);
        store.add(stored(2, 6));
        store.remove(2);

        let inner = store.inner().clone();
        store.shutdown();

        assert_eq!(inner.get(1).map(|o| o.quantity), Some(4));
        assert!(inner.get(2).is_none());
        assert_eq!(inner.len(), 1);
    }
}
