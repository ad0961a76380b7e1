//! Serializable depth snapshots of the in-memory book.
//!
//! The mapped price-level array is a lossy projection; readers that need
//! authoritative depth take one of these snapshots from the engine side
//! instead.

use super::book::OrderBook;
use crate::matchbook::types::Side;
use crate::utils::current_time_nanos;
use serde::{Deserialize, Serialize};

/// One aggregated price level in a depth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    /// The level's price.
    pub price: u64,
    /// Sum of resting quantities at the price.
    pub quantity: u64,
    /// Number of resting orders at the price.
    pub order_count: u64,
}

/// A point-in-time view of one book's depth.
///
/// Bids are ordered best (highest) first, asks best (lowest) first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// The symbol this snapshot describes.
    pub symbol: String,
    /// Nanosecond timestamp at capture.
    pub timestamp: u64,
    /// Bid levels, best first.
    pub bids: Vec<LevelSnapshot>,
    /// Ask levels, best first.
    pub asks: Vec<LevelSnapshot>,
}

impl BookSnapshot {
    /// Best bid price and quantity.
    pub fn best_bid(&self) -> Option<(u64, u64)> {
        self.bids.first().map(|level| (level.price, level.quantity))
    }

    /// Best ask price and quantity.
    pub fn best_ask(&self) -> Option<(u64, u64)> {
        self.asks.first().map(|level| (level.price, level.quantity))
    }

    /// `best_ask − best_bid`; `None` when either side is empty.
    pub fn spread(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some(ask.saturating_sub(bid)),
            _ => None,
        }
    }

    /// Total resting quantity on the bid side.
    pub fn total_bid_quantity(&self) -> u64 {
        self.bids.iter().map(|level| level.quantity).sum()
    }

    /// Total resting quantity on the ask side.
    pub fn total_ask_quantity(&self) -> u64 {
        self.asks.iter().map(|level| level.quantity).sum()
    }

    /// Whether both sides are empty.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Serialize the snapshot to JSON.
    ///
    /// # Errors
    ///
    /// Returns the underlying serialization error.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns the underlying deserialization error.
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

impl OrderBook {
    /// Capture the top `depth` levels of each side.
    ///
    /// Pass `usize::MAX` for the whole book.
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        BookSnapshot {
            symbol: self.symbol().to_string(),
            timestamp: current_time_nanos(),
            bids: self.depth(Side::Buy, depth),
            asks: self.depth(Side::Sell, depth),
        }
    }

    /// The top `depth` levels on `side`, best price first.
    pub fn depth(&self, side: Side, depth: usize) -> Vec<LevelSnapshot> {
        let mut levels: Vec<LevelSnapshot> = Vec::with_capacity(depth.min(64));
        let mut prices: Vec<u64> = Vec::new();

        // Best-first order: descending bids, ascending asks.
        match side {
            Side::Buy => {
                for price in self.level_prices(side).into_iter().rev().take(depth) {
                    prices.push(price);
                }
            }
            Side::Sell => {
                for price in self.level_prices(side).into_iter().take(depth) {
                    prices.push(price);
                }
            }
        }

        for price in prices {
            if let Some(level) = self.level(side, price) {
                levels.push(LevelSnapshot {
                    price: level.price,
                    quantity: level.total_quantity,
                    order_count: level.order_count,
                });
            }
        }
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchbook::types::{Order, OrderKind, symbol_fingerprint};

    fn limit(id: u64, side: Side, price: u64, quantity: u64) -> Order {
        Order {
            id,
            symbol_fp: symbol_fingerprint("BTC-USD"),
            side,
            kind: OrderKind::Limit,
            price,
            quantity,
            timestamp: id,
        }
    }

    fn populated_book() -> OrderBook {
        let mut book = OrderBook::new("BTC-USD");
        book.process_order(&limit(1, Side::Buy, 4_900, 10));
        book.process_order(&limit(2, Side::Buy, 4_950, 5));
        book.process_order(&limit(3, Side::Sell, 5_000, 7));
        book.process_order(&limit(4, Side::Sell, 5_050, 3));
        book.process_order(&limit(5, Side::Sell, 5_100, 9));
        book
    }

    #[test]
    fn test_snapshot_orders_best_first() {
        let book = populated_book();
        let snapshot = book.snapshot(usize::MAX);

        let bid_prices: Vec<u64> = snapshot.bids.iter().map(|l| l.price).collect();
        let ask_prices: Vec<u64> = snapshot.asks.iter().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![4_950, 4_900]);
        assert_eq!(ask_prices, vec![5_000, 5_050, 5_100]);

        assert_eq!(snapshot.best_bid(), Some((4_950, 5)));
        assert_eq!(snapshot.best_ask(), Some((5_000, 7)));
        assert_eq!(snapshot.spread(), Some(50));
        assert_eq!(snapshot.total_bid_quantity(), 15);
        assert_eq!(snapshot.total_ask_quantity(), 19);
    }

    #[test]
    fn test_depth_truncates_to_top_n() {
        let book = populated_book();
        let top = book.depth(Side::Sell, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].price, 5_000);
        assert_eq!(top[1].price, 5_050);
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let book = populated_book();
        let snapshot = book.snapshot(usize::MAX);

        let json = snapshot.to_json().unwrap_or_default();
        let back =
            BookSnapshot::from_json(&json).unwrap_or_else(|_| panic!("snapshot deserializes"));
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_empty_book_snapshot() {
        let book = OrderBook::new("BTC-USD");
        let snapshot = book.snapshot(10);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.spread(), None);
    }
}
