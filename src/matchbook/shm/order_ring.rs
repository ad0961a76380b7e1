//! Single-producer/single-consumer order intake queue over the region.
//!
//! The producer side is the admission gateway (submitters funnel through
//! its mutex, so the ring sees exactly one producer); the consumer side is
//! the engine thread. Publication discipline: the producer fully writes
//! the slot payload, then release-stores the advanced tail; the consumer
//! acquire-loads the tail before touching any slot. The head is handled
//! symmetrically so the producer never reuses a slot the consumer is
//! still reading.
//!
//! # Slot format (44 bytes, little-endian)
//!
//! ```text
//! [8 order_id][4 symbol_fp][4 side][4 kind][8 price][8 quantity][8 timestamp]
//! ```

use super::layout::{N_ORDER, ORDER_SLOT_SIZE, order_slot_offset};
use super::region::SharedRegion;
use crate::matchbook::types::{Order, OrderKind, Side};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Upper bound on invalid slots discarded within a single `poll` call.
const MAX_CONSECUTIVE_DISCARDS: u32 = 100;

/// Handle on the order ring.
///
/// Both sides construct their own handle over the same [`SharedRegion`];
/// the SPSC contract is enforced by the callers (one gateway, one engine
/// thread), not by this type.
pub struct OrderRing {
    region: Arc<SharedRegion>,
    /// Slots dropped by the consumer because they failed the validity
    /// predicate.
    corrupt_discarded: AtomicU64,
}

impl OrderRing {
    /// Create a handle over `region`.
    pub fn new(region: Arc<SharedRegion>) -> Self {
        Self {
            region,
            corrupt_discarded: AtomicU64::new(0),
        }
    }

    /// Serialize `order` into the next slot and publish it.
    ///
    /// Returns `false` without side effects when the ring is full
    /// (`(tail + 1) mod N == head`); the caller decides whether to retry.
    pub fn offer(&self, order: &Order) -> bool {
        let tail = self.region.order_tail().load(Ordering::Relaxed);
        let head = self.region.order_head().load(Ordering::Acquire);
        let next = (tail + 1) % N_ORDER as u64;
        if next == head {
            return false;
        }

        let buf = encode_order(order);
        // SAFETY: the slot at `tail` is unpublished and producer-owned
        // until the release store below.
        unsafe {
            self.region.write_from(order_slot_offset(tail as usize), &buf);
        }
        self.region.order_tail().store(next, Ordering::Release);
        true
    }

    /// Take the next published order off the ring.
    ///
    /// Returns `None` when the ring is empty. A slot that fails the
    /// validity predicate is discarded with a warning and the head still
    /// advances; at most [`MAX_CONSECUTIVE_DISCARDS`] slots are dropped in
    /// one call so pathological corruption cannot starve the caller.
    pub fn poll(&self) -> Option<Order> {
        for _ in 0..MAX_CONSECUTIVE_DISCARDS {
            let head = self.region.order_head().load(Ordering::Relaxed);
            let tail = self.region.order_tail().load(Ordering::Acquire);
            if head == tail {
                return None;
            }

            let mut buf = [0u8; ORDER_SLOT_SIZE];
            self.region.read_into(order_slot_offset(head as usize), &mut buf);
            let order = decode_order(&buf);

            self.region
                .order_head()
                .store((head + 1) % N_ORDER as u64, Ordering::Release);

            if order.is_valid() {
                return Some(order);
            }

            self.corrupt_discarded.fetch_add(1, Ordering::Relaxed);
            warn!(
                order_id = order.id,
                slot = head,
                "discarding invalid order slot"
            );
        }
        None
    }

    /// Number of published, unconsumed orders.
    pub fn len(&self) -> usize {
        let head = self.region.order_head().load(Ordering::Acquire);
        let tail = self.region.order_tail().load(Ordering::Acquire);
        ((tail + N_ORDER as u64 - head) % N_ORDER as u64) as usize
    }

    /// Whether the ring holds no published orders.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the next `offer` would be refused.
    pub fn is_full(&self) -> bool {
        self.len() == N_ORDER - 1
    }

    /// Total invalid slots discarded by this consumer handle.
    pub fn corrupt_discarded(&self) -> u64 {
        self.corrupt_discarded.load(Ordering::Relaxed)
    }
}

/// Serialize an order into its 44-byte slot image.
fn encode_order(order: &Order) -> [u8; ORDER_SLOT_SIZE] {
    let mut buf = [0u8; ORDER_SLOT_SIZE];
    buf[0..8].copy_from_slice(&order.id.to_le_bytes());
    buf[8..12].copy_from_slice(&order.symbol_fp.to_le_bytes());
    buf[12..16].copy_from_slice(&order.side.as_u32().to_le_bytes());
    buf[16..20].copy_from_slice(&order.kind.as_u32().to_le_bytes());
    buf[20..28].copy_from_slice(&order.price.to_le_bytes());
    buf[28..36].copy_from_slice(&order.quantity.to_le_bytes());
    buf[36..44].copy_from_slice(&order.timestamp.to_le_bytes());
    buf
}

/// Deserialize an order from its slot image. Never fails: out-of-range
/// discriminants decode to the zero variant and the caller applies the
/// validity predicate.
fn decode_order(buf: &[u8; ORDER_SLOT_SIZE]) -> Order {
    let u64_at = |at: usize| {
        let mut b = [0u8; 8];
        b.copy_from_slice(&buf[at..at + 8]);
        u64::from_le_bytes(b)
    };
    let u32_at = |at: usize| {
        let mut b = [0u8; 4];
        b.copy_from_slice(&buf[at..at + 4]);
        u32::from_le_bytes(b)
    };

    Order {
        id: u64_at(0),
        symbol_fp: u32_at(8),
        side: Side::from_u32(u32_at(12)),
        kind: OrderKind::from_u32(u32_at(16)),
        price: u64_at(20),
        quantity: u64_at(28),
        timestamp: u64_at(36),
    }
}
