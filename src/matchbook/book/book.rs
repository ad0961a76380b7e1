//! Per-symbol order book: sorted price levels, price FIFOs, and the
//! price–time priority matching algorithm.
//!
//! The book is owned exclusively by the engine thread; `process_order` is
//! not re-entrant on the same book and every incoming order reaches a
//! terminal state within one call. The book is addressed by symbol
//! fingerprint — routing an order to the right book (and dropping orders
//! for unknown fingerprints) is the engine's job, not the book's.

use super::level::{PriceLevel, RestingOrder};
use crate::matchbook::store::{RestingOrderStore, StoredOrder};
use crate::matchbook::types::{Order, OrderKind, Side, symbol_fingerprint};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tracing::trace;

/// A single fill produced while matching one incoming order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// The buy-side order of this fill.
    pub buy_order_id: u64,
    /// The sell-side order of this fill.
    pub sell_order_id: u64,
    /// Execution price — always the resting side's price level.
    pub price: u64,
    /// Executed quantity.
    pub quantity: u64,
}

/// Everything `process_order` did to the book for one incoming order.
///
/// Fills appear in match order: best price first, FIFO within a price.
/// `touched` lists every `(side, price)` whose level changed, for mirroring
/// into the mapped snapshot array. Trade identifiers are not assigned
/// here — the trade ring assigns them when the engine commits each fill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Fills in match order.
    pub fills: Vec<Fill>,
    /// Price levels whose aggregates changed, including vanished ones.
    pub touched: Vec<(Side, u64)>,
    /// Quantity left unfilled after matching.
    pub remainder: u64,
    /// Whether the remainder was rested in the book (limit orders only).
    pub rested: bool,
}

impl MatchOutcome {
    /// Total quantity executed across all fills.
    #[must_use]
    pub fn executed_quantity(&self) -> u64 {
        self.fills.iter().map(|fill| fill.quantity).sum()
    }

    /// Whether the incoming order was fully filled.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remainder == 0
    }

    fn touch(&mut self, side: Side, price: u64) {
        if !self.touched.contains(&(side, price)) {
            self.touched.push((side, price));
        }
    }
}

/// A limit order book for one symbol.
///
/// Four owning maps per the single-writer design: sorted price → aggregate
/// level per side, and price → FIFO of resting orders per side. The
/// aggregates are a derived cache kept in O(1) sync with the FIFOs; there
/// are no back-links from orders to levels.
pub struct OrderBook {
    /// The symbol this book trades.
    symbol: String,
    /// Fingerprint of `symbol`.
    symbol_fp: u32,

    /// Bid aggregates; best bid is the last (greatest) key.
    bids: BTreeMap<u64, PriceLevel>,
    /// Ask aggregates; best ask is the first (smallest) key.
    asks: BTreeMap<u64, PriceLevel>,
    /// Bid FIFOs keyed by price.
    bid_queues: BTreeMap<u64, VecDeque<RestingOrder>>,
    /// Ask FIFOs keyed by price.
    ask_queues: BTreeMap<u64, VecDeque<RestingOrder>>,

    /// Cached best bid; 0 when the bid side is empty.
    best_bid: u64,
    /// Cached best ask; `u64::MAX` when the ask side is empty.
    best_ask: u64,

    /// When set, a market order's unfilled remainder is recorded to the
    /// side store keyed at the last execution price instead of being
    /// silently dropped. Operational visibility only — the remainder never
    /// rests in the book either way.
    park_market_remainder: bool,

    /// Observer index updated as resting orders change.
    store: Option<Arc<dyn RestingOrderStore>>,
}

impl OrderBook {
    /// Create an empty book for `symbol`.
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            symbol_fp: symbol_fingerprint(symbol),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            bid_queues: BTreeMap::new(),
            ask_queues: BTreeMap::new(),
            best_bid: 0,
            best_ask: u64::MAX,
            park_market_remainder: false,
            store: None,
        }
    }

    /// Create an empty book wired to a resting-order side store.
    pub fn with_store(symbol: &str, store: Arc<dyn RestingOrderStore>) -> Self {
        let mut book = Self::new(symbol);
        book.store = Some(store);
        book
    }

    /// Enable or disable parking market remainders in the side store.
    pub fn set_park_market_remainder(&mut self, park: bool) {
        self.park_market_remainder = park;
    }

    /// The symbol this book trades.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Fingerprint of the symbol.
    pub fn symbol_fp(&self) -> u32 {
        self.symbol_fp
    }

    /// Highest resting bid price, if any bid rests.
    pub fn best_bid(&self) -> Option<u64> {
        (self.best_bid != 0).then_some(self.best_bid)
    }

    /// Lowest resting ask price, if any ask rests.
    pub fn best_ask(&self) -> Option<u64> {
        (self.best_ask != u64::MAX).then_some(self.best_ask)
    }

    /// `best_ask − best_bid`; `None` when either side is empty.
    pub fn spread(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.saturating_sub(bid)),
            _ => None,
        }
    }

    /// Midpoint of the best prices; `None` when either side is empty.
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid as f64 + ask as f64) / 2.0),
            _ => None,
        }
    }

    /// The aggregate level at `price` on `side`, if present.
    pub fn level(&self, side: Side, price: u64) -> Option<PriceLevel> {
        match side {
            Side::Buy => self.bids.get(&price).copied(),
            Side::Sell => self.asks.get(&price).copied(),
        }
    }

    /// The resting orders at `price` on `side`, front of the FIFO first.
    pub fn orders_at(&self, side: Side, price: u64) -> Vec<RestingOrder> {
        let queues = match side {
            Side::Buy => &self.bid_queues,
            Side::Sell => &self.ask_queues,
        };
        queues
            .get(&price)
            .map(|queue| queue.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The populated prices on `side`, ascending.
    pub fn level_prices(&self, side: Side) -> Vec<u64> {
        match side {
            Side::Buy => self.bids.keys().copied().collect(),
            Side::Sell => self.asks.keys().copied().collect(),
        }
    }

    /// Number of populated price levels on `side`.
    pub fn level_count(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.bids.len(),
            Side::Sell => self.asks.len(),
        }
    }

    /// Whether neither side holds any resting order.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Match one incoming order against the book.
    ///
    /// Limit orders sweep the opposite side while it crosses, then rest
    /// any remainder at their own price. Market orders sweep without a
    /// price cap and their remainder is dropped (optionally parked in the
    /// side store, never in the book). The best-price caches are refreshed
    /// before returning, so every terminal state is reached within this
    /// call.
    pub fn process_order(&mut self, order: &Order) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        let mut remaining = order.quantity;

        let limit = match order.kind {
            OrderKind::Limit => Some(order.price),
            OrderKind::Market => None,
        };

        match order.side {
            Side::Buy => sweep_side(
                &mut self.asks,
                &mut self.ask_queues,
                order,
                limit,
                &mut remaining,
                &mut outcome,
                self.store.as_deref(),
            ),
            Side::Sell => sweep_side(
                &mut self.bids,
                &mut self.bid_queues,
                order,
                limit,
                &mut remaining,
                &mut outcome,
                self.store.as_deref(),
            ),
        }

        outcome.remainder = remaining;

        if remaining > 0 {
            match order.kind {
                OrderKind::Limit => self.rest(order, remaining, &mut outcome),
                OrderKind::Market => self.drop_market_remainder(order, remaining, &outcome),
            }
        }

        self.refresh_best();
        outcome
    }

    /// Park the remainder of a limit order at its own price.
    fn rest(&mut self, order: &Order, remainder: u64, outcome: &mut MatchOutcome) {
        let resting = RestingOrder::from_order(order, remainder);
        let (levels, queues) = match order.side {
            Side::Buy => (&mut self.bids, &mut self.bid_queues),
            Side::Sell => (&mut self.asks, &mut self.ask_queues),
        };

        queues.entry(order.price).or_default().push_back(resting);
        levels
            .entry(order.price)
            .or_insert_with(|| PriceLevel::empty(order.price))
            .add(remainder);
        outcome.touch(order.side, order.price);
        outcome.rested = true;

        if let Some(store) = &self.store {
            store.add(StoredOrder {
                id: order.id,
                symbol_fp: self.symbol_fp,
                side: order.side,
                kind: order.kind,
                price: order.price,
                quantity: remainder,
                timestamp: order.timestamp,
            });
        }

        trace!(
            order_id = order.id,
            price = order.price,
            quantity = remainder,
            side = %order.side,
            "rested limit remainder"
        );
    }

    /// Discard a market order's remainder; never rests in the book.
    fn drop_market_remainder(&self, order: &Order, remainder: u64, outcome: &MatchOutcome) {
        if self.park_market_remainder
            && let Some(store) = &self.store
            && let Some(last_fill) = outcome.fills.last()
        {
            store.add(StoredOrder {
                id: order.id,
                symbol_fp: self.symbol_fp,
                side: order.side,
                kind: order.kind,
                price: last_fill.price,
                quantity: remainder,
                timestamp: order.timestamp,
            });
        }
        trace!(
            order_id = order.id,
            quantity = remainder,
            side = %order.side,
            "dropped market remainder"
        );
    }

    /// Refresh the cached best prices from the sorted maps.
    fn refresh_best(&mut self) {
        self.best_bid = self.bids.last_key_value().map(|(p, _)| *p).unwrap_or(0);
        self.best_ask = self
            .asks
            .first_key_value()
            .map(|(p, _)| *p)
            .unwrap_or(u64::MAX);
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("symbol", &self.symbol)
            .field("bid_levels", &self.bids.len())
            .field("ask_levels", &self.asks.len())
            .field("best_bid", &self.best_bid())
            .field("best_ask", &self.best_ask())
            .finish()
    }
}

/// Sweep the opposite side of the book for one incoming order.
///
/// Consumes levels best price first (smallest ask / greatest bid), each
/// FIFO front-to-back. `limit` is `None` for market orders. Extracted so
/// the buy and sell paths share one body; the caller picks which maps are
/// the opposite side.
#[allow(clippy::too_many_arguments)]
fn sweep_side(
    levels: &mut BTreeMap<u64, PriceLevel>,
    queues: &mut BTreeMap<u64, VecDeque<RestingOrder>>,
    taker: &Order,
    limit: Option<u64>,
    remaining: &mut u64,
    outcome: &mut MatchOutcome,
    store: Option<&dyn RestingOrderStore>,
) {
    // Sweeping asks (buy taker) starts at the smallest key; sweeping bids
    // starts at the greatest.
    let sweeping_bids = taker.side == Side::Sell;
    let resting_side = taker.side.opposite();

    while *remaining > 0 {
        let best = if sweeping_bids {
            queues.last_key_value().map(|(p, _)| *p)
        } else {
            queues.first_key_value().map(|(p, _)| *p)
        };
        let Some(price) = best else { break };

        if let Some(cap) = limit {
            let crosses = if sweeping_bids {
                price >= cap
            } else {
                price <= cap
            };
            if !crosses {
                break;
            }
        }

        outcome.touch(resting_side, price);

        let Some(queue) = queues.get_mut(&price) else {
            break;
        };

        while *remaining > 0 {
            let Some(front) = queue.front_mut() else { break };

            let quantity = (*remaining).min(front.quantity);
            let (buy_order_id, sell_order_id) = match taker.side {
                Side::Buy => (taker.id, front.id),
                Side::Sell => (front.id, taker.id),
            };
            outcome.fills.push(Fill {
                buy_order_id,
                sell_order_id,
                price,
                quantity,
            });

            *remaining -= quantity;
            front.quantity -= quantity;
            let consumed = front.quantity == 0;

            if let Some(level) = levels.get_mut(&price) {
                level.reduce(quantity, consumed);
            }

            if consumed {
                let done = queue.pop_front();
                if let (Some(store), Some(done)) = (store, done) {
                    store.remove(done.id);
                }
            } else if let Some(store) = store {
                store.update_quantity(front.id, front.quantity);
            }
        }

        if queue.is_empty() {
            queues.remove(&price);
            levels.remove(&price);
        }
    }
}
