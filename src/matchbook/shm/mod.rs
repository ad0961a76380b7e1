//! Shared mapped region subsystem: layout, region handle, ring queues,
//! snapshot tables, and the read-only reader.
//!
//! # Types
//!
//! - [`SharedRegion`] — engine-side read-write mapping and header atomics
//! - [`OrderRing`] / [`TradeRing`] — SPSC ring queues over the region
//! - [`MarketDataTable`] / [`PriceLevelTable`] — dense snapshot arrays
//! - [`RegionReader`] — uncoordinated read-only access
//! - [`RegionError`] — fatal initialization/IO errors

pub mod error;
pub mod layout;
pub mod order_ring;
pub mod reader;
pub mod region;
pub mod tables;
pub mod trade_ring;

pub use error::RegionError;
pub use layout::{
    MAX_LEVELS, MAX_SYMBOLS, N_ORDER, N_TRADE, ORDER_SLOT_SIZE, REGION_SIZE, SCHEMA_VERSION,
    TRADE_SLOT_SIZE,
};
pub use order_ring::OrderRing;
pub use reader::RegionReader;
pub use region::{STATUS_ACTIVE, STATUS_IDLE, SharedRegion};
pub use tables::{LevelRecord, MarketDataTable, PriceLevelTable};
pub use trade_ring::TradeRing;
