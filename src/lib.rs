//! # Matchbook — a shared-memory limit order matching engine core
//!
//! A single-venue, multi-symbol limit order matching engine written in Rust.
//! Orders are admitted through a validating gateway, carried to the engine
//! over a lock-free single-producer/single-consumer ring in a shared
//! memory-mapped region, matched under strict price–time priority, and the
//! resulting trades, top-of-book market data, and price-level snapshots are
//! published back into the same region for uncoordinated readers.
//!
//! ## Key Features
//!
//! - **Single-writer matching core**: one dedicated engine thread owns all
//!   book state, the trade ring, and every snapshot array. Matching never
//!   takes a lock and never suspends mid-order.
//!
//! - **Shared mapped region**: a fixed ~554 MiB file with a bit-exact
//!   little-endian layout — header, order ring, trade ring, dense
//!   market-data array, and a dense per-symbol price-level array. Readers
//!   map it read-only and tolerate one-generation staleness.
//!
//! - **SPSC ring discipline**: producers publish the tail with a release
//!   store only after the slot payload is fully written; consumers
//!   acquire-load the tail before reading a slot. The admission gateway's
//!   mutex funnels any number of submitter threads into the single
//!   producer the contract requires.
//!
//! - **Strict price–time priority**: best price first; within a price
//!   level, resting orders match in the exact order they were appended.
//!   Timestamps are informational, never authoritative.
//!
//! - **Defensive intake**: a polled slot failing the validity predicate is
//!   discarded with a warning and a counter, bounded per poll so corrupted
//!   memory cannot starve the engine.
//!
//! - **Side-store contract**: resting orders are mirrored into a pluggable
//!   observer store (in-memory or channel-backed); the engine never blocks
//!   on it and works with no store at all.
//!
//! ## Architecture
//!
//! ```text
//! submitters ──► OrderGateway ──► OrderRing ─┐
//!                 (validate,       (mmap)    │
//!                  id, stamp)                ▼
//!                                     MatchingEngine ──► TradeRing (mmap)
//!                                      │  per-symbol     ├► MarketData[]
//!                                      │  OrderBooks     └► PriceLevels[]
//!                                      ▼
//!                               RestingOrderStore
//! ```
//!
//! The per-symbol book keeps two sorted maps of price → aggregate level
//! (bids iterated descending, asks ascending) and two maps of price →
//! FIFO of resting orders. The aggregates are a derived cache maintained
//! in O(1) per fill; there are no back-links from orders to levels.
//!
//! ## Example
//!
//! ```rust,no_run
//! use matchbook_rs::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let region = SharedRegion::open("/dev/shm/matchbook.region")?;
//! let registry = Arc::new(SymbolRegistry::with_defaults()?);
//!
//! let gateway = OrderGateway::new(region.clone(), registry.clone());
//! let engine = MatchingEngine::new(region.clone(), registry);
//! let handle = engine.spawn();
//!
//! gateway.submit_limit("BTC-USD", Side::Sell, 50_000, 10)?;
//! gateway.submit_limit("BTC-USD", Side::Buy, 50_000, 4)?;
//!
//! // Uncoordinated reader over the same file.
//! let reader = RegionReader::open("/dev/shm/matchbook.region")?;
//! let fp = symbol_fingerprint("BTC-USD");
//! if let Some((_, md)) = reader.find_symbol(fp) {
//!     println!("last {} best_ask {}", md.last_price, md.best_ask);
//! }
//!
//! handle.stop()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency model
//!
//! The mapped region is the only shared mutable resource. Header words used
//! as ring indices are written with release semantics and read with
//! acquire semantics; every other byte has exactly one writer. The engine
//! thread blocks only when the intake ring is empty (a short sleep) or the
//! trade ring is full (bounded backoff, then a surfaced halt). Shutdown is
//! atomic at the granularity of one incoming order: the engine finishes
//! the order in flight, flushes the region, clears the status word, and
//! exits; joining is bounded by a five-second deadline.
//!
//! ## Status
//!
//! The mapped region is volatile working memory with a best-effort
//! version/status header — it is not a crash-consistent journal. The
//! resting-order store is the optional durable side channel.

pub mod matchbook;

pub mod prelude;
mod utils;

pub use matchbook::admission::OrderGateway;
pub use matchbook::book::{
    BookSnapshot, Fill, LevelSnapshot, MatchOutcome, OrderBook, PriceLevel, RestingOrder,
};
pub use matchbook::engine::{EngineConfig, EngineHandle, MatchingEngine, SHUTDOWN_DEADLINE};
pub use matchbook::error::{EngineError, SubmitError};
pub use matchbook::registry::{DEFAULT_SYMBOLS, SymbolInfo, SymbolRegistry};
pub use matchbook::shm::{
    LevelRecord, MarketDataTable, OrderRing, PriceLevelTable, RegionError, RegionReader,
    SharedRegion, TradeRing,
};
pub use matchbook::stats::{EngineStats, StatsSnapshot};
pub use matchbook::store::{
    ChannelRestingStore, InMemoryRestingStore, RestingOrderStore, StoredOrder,
};
pub use matchbook::types::{MarketData, Order, OrderKind, Side, Trade, symbol_fingerprint};
pub use utils::{current_time_millis, current_time_nanos};
