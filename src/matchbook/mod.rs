//! Matching engine core: order books, shared-region ring queues,
//! admission, and the single-writer engine loop.

pub mod admission;
pub mod book;
pub mod engine;
pub mod error;
pub mod registry;
pub mod shm;
pub mod stats;
pub mod store;
pub mod types;

pub use admission::OrderGateway;
pub use book::{
    BookSnapshot, Fill, LevelSnapshot, MatchOutcome, OrderBook, PriceLevel, RestingOrder,
};
pub use engine::{EngineConfig, EngineHandle, MatchingEngine, SHUTDOWN_DEADLINE};
pub use error::{EngineError, SubmitError};
pub use registry::{DEFAULT_SYMBOLS, SymbolInfo, SymbolRegistry};
pub use stats::{EngineStats, StatsSnapshot};
pub use store::{ChannelRestingStore, InMemoryRestingStore, RestingOrderStore, StoredOrder};
pub use types::{MarketData, Order, OrderKind, Side, Trade, symbol_fingerprint};
