//! The single-writer matching engine loop.
//!
//! One dedicated thread consumes the order ring, dispatches each order to
//! its book by symbol fingerprint, commits the resulting fills to the
//! trade ring, and mirrors market data and touched price levels into the
//! mapped snapshot arrays. The engine is the sole writer of book state,
//! the trade ring, and both snapshot arrays; it may block only when the
//! intake ring is empty (a short sleep) or the trade ring is full (a
//! bounded backoff that ends in a halt).

use crate::matchbook::book::OrderBook;
use crate::matchbook::error::EngineError;
use crate::matchbook::registry::SymbolRegistry;
use crate::matchbook::shm::{
    LevelRecord, MarketDataTable, OrderRing, PriceLevelTable, STATUS_ACTIVE, STATUS_IDLE,
    SharedRegion, TradeRing,
};
use crate::matchbook::stats::EngineStats;
use crate::matchbook::store::RestingOrderStore;
use crate::matchbook::types::{MarketData, Order};
use crate::utils::current_time_nanos;
use crossbeam::utils::Backoff;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Hard deadline on joining the engine thread at shutdown.
pub const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

/// Tunables of the engine loop.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long to sleep when the intake ring is empty.
    pub idle_sleep: Duration,
    /// Ring offers attempted per fill before the engine declares the
    /// trade ring stalled and halts.
    pub trade_ring_retries: u32,
    /// Park market-order remainders in the side store instead of
    /// dropping them silently. They never rest in the book either way.
    pub park_market_remainder: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_sleep: Duration::from_millis(1),
            trade_ring_retries: 100,
            park_market_remainder: false,
        }
    }
}

/// The matching engine.
///
/// Owns every per-symbol book and all engine-side write access to the
/// region. Run it on a dedicated thread via [`MatchingEngine::spawn`], or
/// drive it deterministically with [`MatchingEngine::poll_once`].
pub struct MatchingEngine {
    region: Arc<SharedRegion>,
    order_ring: OrderRing,
    trade_ring: TradeRing,
    md_table: MarketDataTable,
    level_table: PriceLevelTable,
    registry: Arc<SymbolRegistry>,
    books: HashMap<u32, OrderBook>,
    market_data: HashMap<u32, MarketData>,
    store: Option<Arc<dyn RestingOrderStore>>,
    stats: Arc<EngineStats>,
    shutdown: Arc<AtomicBool>,
    config: EngineConfig,
}

impl MatchingEngine {
    /// Create an engine with the default configuration.
    pub fn new(region: Arc<SharedRegion>, registry: Arc<SymbolRegistry>) -> Self {
        Self::with_config(region, registry, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration.
    pub fn with_config(
        region: Arc<SharedRegion>,
        registry: Arc<SymbolRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            order_ring: OrderRing::new(region.clone()),
            trade_ring: TradeRing::new(region.clone()),
            md_table: MarketDataTable::new(region.clone()),
            level_table: PriceLevelTable::new(region.clone()),
            region,
            registry,
            books: HashMap::new(),
            market_data: HashMap::new(),
            store: None,
            stats: Arc::new(EngineStats::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    /// Attach a resting-order side store.
    ///
    /// Books created after this call report add/update/remove to the
    /// store; call it before the first order is processed.
    pub fn set_store(&mut self, store: Arc<dyn RestingOrderStore>) {
        self.store = Some(store);
    }

    /// The engine's statistics counters.
    pub fn stats(&self) -> Arc<EngineStats> {
        self.stats.clone()
    }

    /// The book for `symbol_fp`, if an order for it has been processed.
    pub fn book(&self, symbol_fp: u32) -> Option<&OrderBook> {
        self.books.get(&symbol_fp)
    }

    /// Process at most one order from the intake ring.
    ///
    /// Returns `Ok(true)` when a slot was consumed (including an order
    /// dropped for an unknown fingerprint) and `Ok(false)` when the ring
    /// was empty. This is the deterministic single-step the run loop is
    /// built from.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TradeRingStalled`] when a fill could not be
    /// committed within the bounded retry schedule.
    pub fn poll_once(&mut self) -> Result<bool, EngineError> {
        let Some(order) = self.order_ring.poll() else {
            self.stats
                .record_corrupt_slots(self.order_ring.corrupt_discarded());
            return Ok(false);
        };

        let started = Instant::now();
        let result = self.process(&order);
        self.stats
            .record_latency(started.elapsed().as_nanos() as u64);
        self.stats
            .record_corrupt_slots(self.order_ring.corrupt_discarded());
        result?;
        Ok(true)
    }

    /// Consume the intake ring on the current thread until shut down.
    ///
    /// Marks the region active on entry; on exit — clean shutdown or a
    /// stalled trade ring — flushes the region and marks it idle.
    ///
    /// # Errors
    ///
    /// Returns the error that halted the loop.
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.region.status().store(STATUS_ACTIVE, Ordering::Release);
        info!(
            region = %self.region.path().display(),
            symbols = self.registry.len(),
            "matching engine started"
        );

        let result = loop {
            if self.shutdown.load(Ordering::Acquire) {
                break Ok(());
            }
            match self.poll_once() {
                Ok(true) => {}
                Ok(false) => std::thread::sleep(self.config.idle_sleep),
                Err(e) => break Err(e),
            }
        };

        if let Err(flush_err) = self.region.flush() {
            error!(error = %flush_err, "region flush failed during shutdown");
        }
        self.region.status().store(STATUS_IDLE, Ordering::Release);
        info!(
            orders = self.stats.orders_processed(),
            trades = self.stats.trades_emitted(),
            "matching engine stopped"
        );
        result
    }

    /// Move the engine to its own thread and return a control handle.
    pub fn spawn(mut self) -> EngineHandle {
        let shutdown = self.shutdown.clone();
        let stats = self.stats.clone();
        let thread = std::thread::spawn(move || self.run());
        EngineHandle {
            shutdown,
            stats,
            thread: Some(thread),
        }
    }

    /// Match one order and mirror every effect into the region.
    fn process(&mut self, order: &Order) -> Result<(), EngineError> {
        let Some(info) = self.registry.lookup_fp(order.symbol_fp) else {
            self.stats.record_unknown_symbol();
            warn!(
                order_id = order.id,
                symbol_fp = order.symbol_fp,
                "dropping order for unregistered fingerprint"
            );
            return Ok(());
        };

        let store = self.store.clone();
        let park = self.config.park_market_remainder;
        let book = self.books.entry(order.symbol_fp).or_insert_with(|| {
            let mut book = match store {
                Some(store) => OrderBook::with_store(&info.symbol, store),
                None => OrderBook::new(&info.symbol),
            };
            book.set_park_market_remainder(park);
            book
        });

        let outcome = book.process_order(order);

        // Capture the book-derived state before the borrow ends so the
        // ring and table writes below do not fight the borrow checker.
        let touched: Vec<_> = outcome
            .touched
            .iter()
            .map(|&(side, price)| {
                let record = book
                    .level(side, price)
                    .map(|level| LevelRecord {
                        price: level.price,
                        total_quantity: level.total_quantity,
                        order_count: level.order_count,
                    })
                    .unwrap_or_else(|| LevelRecord::cleared(price));
                (side, record)
            })
            .collect();
        let best_bid = book.best_bid().unwrap_or(0);
        let best_ask = book.best_ask().unwrap_or(0);

        self.stats.record_order();

        // Commit fills in match order; market data follows only after
        // every trade of this order is in the ring.
        for fill in &outcome.fills {
            self.commit_fill(
                fill.buy_order_id,
                fill.sell_order_id,
                fill.price,
                fill.quantity,
                order.symbol_fp,
            )?;
        }
        self.stats.record_trades(outcome.fills.len() as u64);

        let now = current_time_nanos();
        let md = self
            .market_data
            .entry(order.symbol_fp)
            .or_insert_with(|| MarketData {
                symbol_fp: order.symbol_fp,
                ..MarketData::default()
            });
        if let Some(last) = outcome.fills.last() {
            md.last_price = last.price;
            md.last_quantity = last.quantity;
            md.volume_24h = md.volume_24h.saturating_add(outcome.executed_quantity());
        }
        md.best_bid = best_bid;
        md.best_ask = best_ask;
        md.timestamp = now;
        self.md_table.write(info.index, md);

        for (side, record) in touched {
            self.level_table.write(info.index, side, &record);
        }

        self.region.last_update_ts().store(now, Ordering::Release);
        Ok(())
    }

    /// Commit one fill to the trade ring, retrying with backoff while the
    /// ring is full.
    fn commit_fill(
        &self,
        buy_order_id: u64,
        sell_order_id: u64,
        price: u64,
        quantity: u64,
        symbol_fp: u32,
    ) -> Result<u64, EngineError> {
        let backoff = Backoff::new();
        for attempt in 0..self.config.trade_ring_retries {
            if let Some(trade_id) =
                self.trade_ring
                    .offer(buy_order_id, sell_order_id, price, quantity, symbol_fp)
            {
                return Ok(trade_id);
            }

            self.stats.record_trade_ring_full();
            if attempt == 0 {
                error!(buy_order_id, sell_order_id, price, quantity, "trade ring full; retrying");
            }
            if backoff.is_completed() {
                std::thread::sleep(Duration::from_millis(1));
            } else {
                backoff.snooze();
            }
        }

        error!(
            buy_order_id,
            sell_order_id, "trade ring stalled; halting engine"
        );
        Err(EngineError::TradeRingStalled { dropped: 1 })
    }
}

impl std::fmt::Debug for MatchingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingEngine")
            .field("region", &self.region.path())
            .field("books", &self.books.len())
            .field("symbols", &self.registry.len())
            .finish()
    }
}

/// Control handle for a spawned engine.
pub struct EngineHandle {
    shutdown: Arc<AtomicBool>,
    stats: Arc<EngineStats>,
    thread: Option<JoinHandle<Result<(), EngineError>>>,
}

impl EngineHandle {
    /// The engine's statistics counters.
    pub fn stats(&self) -> &Arc<EngineStats> {
        &self.stats
    }

    /// Whether the engine thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(true)
    }

    /// Signal shutdown and join the engine thread.
    ///
    /// The engine finishes the order it is matching, flushes the region,
    /// and clears the status word before exiting.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ShutdownTimeout`] when the thread does not
    /// stop cleanly within [`SHUTDOWN_DEADLINE`], or the error that halted
    /// the run loop earlier.
    pub fn stop(mut self) -> Result<(), EngineError> {
        self.shutdown.store(true, Ordering::Release);
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        let deadline = Instant::now() + SHUTDOWN_DEADLINE;
        while !thread.is_finished() {
            if Instant::now() >= deadline {
                return Err(EngineError::ShutdownTimeout);
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        match thread.join() {
            Ok(result) => result,
            Err(_) => Err(EngineError::ShutdownTimeout),
        }
    }
}
