//! Trade output queue over the region.
//!
//! Same ring discipline as the order ring, but the matching engine is the
//! only producer. Trade identifiers are drawn from the monotonic
//! `next_trade_id` header word at emission time, so identifiers and ring
//! order agree for a single engine.
//!
//! # Slot format (52 bytes, little-endian)
//!
//! ```text
//! [8 trade_id][8 buy_order_id][8 sell_order_id][8 price][8 quantity]
//! [8 timestamp][4 symbol_fp]
//! ```

use super::layout::{N_TRADE, TRADE_SLOT_SIZE, trade_slot_offset};
use super::region::SharedRegion;
use crate::matchbook::types::Trade;
use crate::utils::current_time_nanos;
use std::sync::Arc;
use std::sync::atomic::Ordering;

/// Handle on the trade ring.
pub struct TradeRing {
    region: Arc<SharedRegion>,
}

impl TradeRing {
    /// Create a handle over `region`.
    pub fn new(region: Arc<SharedRegion>) -> Self {
        Self { region }
    }

    /// Assign a trade id, stamp the fill, and publish it.
    ///
    /// Returns the assigned id, or `None` when the ring is full — in that
    /// case nothing advances and no id is consumed. A full trade ring is a
    /// fatal drop condition for the engine, which surfaces it through its
    /// statistics and halts if the condition persists.
    pub fn offer(
        &self,
        buy_order_id: u64,
        sell_order_id: u64,
        price: u64,
        quantity: u64,
        symbol_fp: u32,
    ) -> Option<u64> {
        let tail = self.region.trade_tail().load(Ordering::Relaxed);
        let head = self.region.trade_head().load(Ordering::Acquire);
        let next = (tail + 1) % N_TRADE as u64;
        if next == head {
            return None;
        }

        let trade_id = self.region.next_trade_id().fetch_add(1, Ordering::AcqRel);
        let trade = Trade {
            trade_id,
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            timestamp: current_time_nanos(),
            symbol_fp,
        };

        let buf = encode_trade(&trade);
        // SAFETY: the engine is the sole producer; the slot at `tail` is
        // unpublished until the release store below.
        unsafe {
            self.region.write_from(trade_slot_offset(tail as usize), &buf);
        }
        self.region.trade_tail().store(next, Ordering::Release);
        Some(trade_id)
    }

    /// Take the next published trade off the ring.
    ///
    /// The drain side serves readers and tests; the engine never consumes
    /// its own output.
    pub fn poll(&self) -> Option<Trade> {
        let head = self.region.trade_head().load(Ordering::Relaxed);
        let tail = self.region.trade_tail().load(Ordering::Acquire);
        if head == tail {
            return None;
        }

        let mut buf = [0u8; TRADE_SLOT_SIZE];
        self.region.read_into(trade_slot_offset(head as usize), &mut buf);
        self.region
            .trade_head()
            .store((head + 1) % N_TRADE as u64, Ordering::Release);
        Some(decode_trade(&buf))
    }

    /// Number of published, unconsumed trades.
    pub fn len(&self) -> usize {
        let head = self.region.trade_head().load(Ordering::Acquire);
        let tail = self.region.trade_tail().load(Ordering::Acquire);
        ((tail + N_TRADE as u64 - head) % N_TRADE as u64) as usize
    }

    /// Whether the ring holds no published trades.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the next `offer` would be refused.
    pub fn is_full(&self) -> bool {
        self.len() == N_TRADE - 1
    }
}

/// Serialize a trade into its 52-byte slot image.
fn encode_trade(trade: &Trade) -> [u8; TRADE_SLOT_SIZE] {
    let mut buf = [0u8; TRADE_SLOT_SIZE];
    buf[0..8].copy_from_slice(&trade.trade_id.to_le_bytes());
    buf[8..16].copy_from_slice(&trade.buy_order_id.to_le_bytes());
    buf[16..24].copy_from_slice(&trade.sell_order_id.to_le_bytes());
    buf[24..32].copy_from_slice(&trade.price.to_le_bytes());
    buf[32..40].copy_from_slice(&trade.quantity.to_le_bytes());
    buf[40..48].copy_from_slice(&trade.timestamp.to_le_bytes());
    buf[48..52].copy_from_slice(&trade.symbol_fp.to_le_bytes());
    buf
}

/// Deserialize a trade from its slot image.
fn decode_trade(buf: &[u8; TRADE_SLOT_SIZE]) -> Trade {
    let u64_at = |at: usize| {
        let mut b = [0u8; 8];
        b.copy_from_slice(&buf[at..at + 8]);
        u64::from_le_bytes(b)
    };
    let mut fp = [0u8; 4];
    fp.copy_from_slice(&buf[48..52]);

    Trade {
        trade_id: u64_at(0),
        buy_order_id: u64_at(8),
        sell_order_id: u64_at(16),
        price: u64_at(24),
        quantity: u64_at(32),
        timestamp: u64_at(40),
        symbol_fp: u32::from_le_bytes(fp),
    }
}
