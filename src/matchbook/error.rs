//! Engine and admission error types.

use crate::matchbook::shm::RegionError;
use std::fmt;

/// Errors surfaced to order submitters by the admission gateway.
///
/// Every variant is produced before the order reaches the ring, except
/// [`SubmitError::RingFull`], which is transient: the caller decides
/// whether to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmitError {
    /// The symbol is not registered with the engine.
    UnknownSymbol {
        /// The symbol string that failed the lookup.
        symbol: String,
    },

    /// Order quantity must be positive.
    InvalidQuantity {
        /// The rejected quantity.
        quantity: u64,
    },

    /// A limit order must carry a positive price.
    InvalidPrice {
        /// The rejected price.
        price: u64,
    },

    /// The order ring has no free slot; the submission was not enqueued.
    RingFull,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::UnknownSymbol { symbol } => {
                write!(f, "unknown symbol: {symbol}")
            }
            SubmitError::InvalidQuantity { quantity } => {
                write!(f, "invalid quantity: {quantity} (must be positive)")
            }
            SubmitError::InvalidPrice { price } => {
                write!(f, "invalid limit price: {price} (must be positive)")
            }
            SubmitError::RingFull => {
                write!(f, "order ring full; submission not enqueued")
            }
        }
    }
}

impl std::error::Error for SubmitError {}

/// Errors that stop the matching engine or refuse its construction.
#[derive(Debug)]
#[non_exhaustive]
pub enum EngineError {
    /// The shared region could not be created, sized, or mapped.
    Region(RegionError),

    /// Registering a symbol would collide with an existing fingerprint.
    FingerprintCollision {
        /// The symbol that was being registered.
        symbol: String,
        /// The symbol already registered under the same fingerprint.
        existing: String,
        /// The colliding 32-bit fingerprint.
        fingerprint: u32,
    },

    /// The symbol table is at capacity.
    SymbolTableFull {
        /// Configured maximum number of symbols.
        max_symbols: usize,
    },

    /// The trade ring stayed full through the bounded retry schedule.
    /// The engine sets the region status to idle and halts.
    TradeRingStalled {
        /// Trades that could not be committed before the engine halted.
        dropped: u64,
    },

    /// The engine thread did not join within the shutdown deadline.
    ShutdownTimeout,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Region(err) => write!(f, "shared region error: {err}"),
            EngineError::FingerprintCollision {
                symbol,
                existing,
                fingerprint,
            } => {
                write!(
                    f,
                    "fingerprint collision: {symbol} and {existing} both hash \
                     to {fingerprint:#010x}"
                )
            }
            EngineError::SymbolTableFull { max_symbols } => {
                write!(f, "symbol table full ({max_symbols} symbols)")
            }
            EngineError::TradeRingStalled { dropped } => {
                write!(
                    f,
                    "trade ring full after bounded retries; {dropped} trade(s) dropped, \
                     engine halted"
                )
            }
            EngineError::ShutdownTimeout => {
                write!(f, "engine thread did not stop within the shutdown deadline")
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<RegionError> for EngineError {
    fn from(err: RegionError) -> Self {
        EngineError::Region(err)
    }
}
