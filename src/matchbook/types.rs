//! Core domain types: orders, trades, market data, symbol fingerprints.
//!
//! All wire-facing enums place their zero variant on the least dangerous
//! value (`Side::Buy`, `OrderKind::Limit`) so that a zero-initialized ring
//! slot decodes to a plainly invalid order (id = 0) instead of a corrupt
//! discriminant. Decoding an out-of-range discriminant never fails: it maps
//! to the zero variant and the record is judged by [`Order::is_valid`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Compute the 32-bit fingerprint of a symbol string.
///
/// Fingerprints are the compact symbol identifier carried in every mapped
/// record. Distinct symbols may collide; the registry refuses to register
/// a colliding symbol rather than disambiguate.
#[must_use]
pub fn symbol_fingerprint(symbol: &str) -> u32 {
    crc32fast::hash(symbol.as_bytes())
}

/// The side of an order or a price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Bid side.
    Buy,
    /// Ask side.
    Sell,
}

impl Side {
    /// The side an incoming order matches against.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Wire discriminant (`0 = Buy`, `1 = Sell`).
    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            Side::Buy => 0,
            Side::Sell => 1,
        }
    }

    /// Decode a wire discriminant; out-of-range values map to `Buy`.
    #[must_use]
    pub fn from_u32(raw: u32) -> Self {
        match raw {
            1 => Side::Sell,
            _ => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// The pricing mode of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    /// Execute at `price` or better; the remainder rests in the book.
    Limit,
    /// Sweep available liquidity at any price; the remainder is dropped.
    Market,
}

impl OrderKind {
    /// Wire discriminant (`0 = Limit`, `1 = Market`).
    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            OrderKind::Limit => 0,
            OrderKind::Market => 1,
        }
    }

    /// Decode a wire discriminant; out-of-range values map to `Limit`.
    #[must_use]
    pub fn from_u32(raw: u32) -> Self {
        match raw {
            1 => OrderKind::Market,
            _ => OrderKind::Limit,
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Limit => write!(f, "LIMIT"),
            OrderKind::Market => write!(f, "MARKET"),
        }
    }
}

/// A submitted order as it travels through the order ring.
///
/// Prices are integers in the symbol's minor unit; quantities are integers
/// in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique positive identifier assigned at admission.
    pub id: u64,
    /// Fingerprint of the symbol this order trades.
    pub symbol_fp: u32,
    /// Buy or sell.
    pub side: Side,
    /// Limit or market.
    pub kind: OrderKind,
    /// Limit price; 0 for a pure market order.
    pub price: u64,
    /// Quantity to trade; must be positive.
    pub quantity: u64,
    /// Nanosecond timestamp stamped at admission.
    pub timestamp: u64,
}

impl Order {
    /// The validity predicate applied to every polled ring slot.
    ///
    /// A zero-initialized slot fails on `id == 0` before any other field
    /// is consulted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.id > 0
            && self.quantity > 0
            && self.timestamp > 0
            && (self.kind == OrderKind::Market || self.price > 0)
    }
}

/// A fill emitted by the matching engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Monotonic identifier assigned from the region header at emission.
    pub trade_id: u64,
    /// The buy-side order of this fill.
    pub buy_order_id: u64,
    /// The sell-side order of this fill.
    pub sell_order_id: u64,
    /// Execution price (the resting side's price level).
    pub price: u64,
    /// Executed quantity.
    pub quantity: u64,
    /// Nanosecond timestamp stamped at emission.
    pub timestamp: u64,
    /// Fingerprint of the traded symbol.
    pub symbol_fp: u32,
}

/// Per-symbol top-of-book market data, mirrored into the mapped region
/// after every processed order.
///
/// A side with no resting orders reports 0 for its best price, matching
/// what a reader of zero-initialized memory observes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketData {
    /// Fingerprint of the symbol this record describes.
    pub symbol_fp: u32,
    /// Price of the most recent trade.
    pub last_price: u64,
    /// Quantity of the most recent trade.
    pub last_quantity: u64,
    /// Cumulative traded volume since engine start.
    pub volume_24h: u64,
    /// Highest resting bid price, 0 when the bid side is empty.
    pub best_bid: u64,
    /// Lowest resting ask price, 0 when the ask side is empty.
    pub best_ask: u64,
    /// Nanosecond timestamp of the last update.
    pub timestamp: u64,
}
