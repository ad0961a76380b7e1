//! Prelude module that re-exports commonly used types and traits.
//!
//! Instead of importing each type individually, you can use:
//!
//! ```rust
//! use matchbook_rs::prelude::*;
//! ```
//!
//! This imports everything needed to wire up a region, an admission
//! gateway, the engine, and a reader.

// Core engine types
pub use crate::matchbook::engine::{EngineConfig, EngineHandle, MatchingEngine};
pub use crate::matchbook::error::{EngineError, SubmitError};

// Admission and symbol registration
pub use crate::matchbook::admission::OrderGateway;
pub use crate::matchbook::registry::{DEFAULT_SYMBOLS, SymbolInfo, SymbolRegistry};

// Shared region, rings, and reader-facing types
pub use crate::matchbook::shm::{
    LevelRecord, MarketDataTable, OrderRing, PriceLevelTable, RegionError, RegionReader,
    SharedRegion, TradeRing,
};

// Book and snapshot types
pub use crate::matchbook::book::{
    BookSnapshot, Fill, LevelSnapshot, MatchOutcome, OrderBook, PriceLevel, RestingOrder,
};

// Side-store contract and implementations
pub use crate::matchbook::store::{
    ChannelRestingStore, InMemoryRestingStore, RestingOrderStore, StoredOrder,
};

// Domain primitives
pub use crate::matchbook::types::{
    MarketData, Order, OrderKind, Side, Trade, symbol_fingerprint,
};

// Statistics
pub use crate::matchbook::stats::{EngineStats, StatsSnapshot};

// Utility functions
pub use crate::utils::{current_time_millis, current_time_nanos};
