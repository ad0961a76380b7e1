//! Resting orders and the per-price aggregate they roll up into.

use crate::matchbook::types::{Order, OrderKind, Side};
use serde::{Deserialize, Serialize};

/// The unfilled remainder of a limit order, parked in a price FIFO.
///
/// The price is the key of the FIFO the order lives in and is not
/// duplicated here. The timestamp is informational; the order's position
/// in its FIFO is what decides matching priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrder {
    /// Identifier of the originating order.
    pub id: u64,
    /// Side the order rests on.
    pub side: Side,
    /// Pricing mode of the originating order.
    pub kind: OrderKind,
    /// Remaining quantity; the order is removed when this reaches zero.
    pub quantity: u64,
    /// Nanosecond timestamp of the originating order.
    pub timestamp: u64,
}

impl RestingOrder {
    /// Derive the resting remainder of `order`.
    #[must_use]
    pub fn from_order(order: &Order, remainder: u64) -> Self {
        Self {
            id: order.id,
            side: order.side,
            kind: order.kind,
            quantity: remainder,
            timestamp: order.timestamp,
        }
    }
}

/// Aggregate state of one price on one side of a book.
///
/// A derived cache over the FIFO at the same price: `total_quantity` and
/// `order_count` always equal the sum and length of that FIFO. Maintained
/// in O(1) on every fill and insertion rather than recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// The level's price.
    pub price: u64,
    /// Sum of resting quantities at this price.
    pub total_quantity: u64,
    /// Number of resting orders at this price.
    pub order_count: u64,
}

impl PriceLevel {
    /// An empty level at `price`.
    #[must_use]
    pub fn empty(price: u64) -> Self {
        Self {
            price,
            total_quantity: 0,
            order_count: 0,
        }
    }

    /// Account for a newly rested order of `quantity`.
    pub fn add(&mut self, quantity: u64) {
        self.total_quantity = self.total_quantity.saturating_add(quantity);
        self.order_count = self.order_count.saturating_add(1);
    }

    /// Account for a fill of `quantity` against one resting order.
    ///
    /// The order count drops only when the resting order was fully
    /// consumed by this fill.
    pub fn reduce(&mut self, quantity: u64, consumed: bool) {
        self.total_quantity = self.total_quantity.saturating_sub(quantity);
        if consumed {
            self.order_count = self.order_count.saturating_sub(1);
        }
    }

    /// Whether the level carries no resting quantity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }
}
