//! Fingerprint-addressed symbol table shared by admission and the engine.
//!
//! Registration order assigns each symbol its index into the mapped
//! market-data and price-level arrays. Fingerprints must be unique: a
//! collision is refused rather than disambiguated, because every mapped
//! record identifies its symbol by fingerprint alone.

use crate::matchbook::error::EngineError;
use crate::matchbook::shm::MAX_SYMBOLS;
use crate::matchbook::types::symbol_fingerprint;
use dashmap::DashMap;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// The default symbols seeded at startup.
pub const DEFAULT_SYMBOLS: [&str; 5] = ["BTC-USD", "ETH-USD", "BNB-USD", "ADA-USD", "SOL-USD"];

/// A registered symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    /// The symbol string.
    pub symbol: String,
    /// CRC32 fingerprint of the symbol.
    pub fingerprint: u32,
    /// Index into the mapped market-data and price-level arrays.
    pub index: usize,
}

/// Concurrent symbol table.
///
/// Lookups are lock-free; registration serializes on a mutex so the
/// index assignment and the collision check stay atomic.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    by_fp: DashMap<u32, SymbolInfo>,
    ordered: Mutex<Vec<String>>,
}

impl SymbolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with [`DEFAULT_SYMBOLS`].
    ///
    /// # Errors
    ///
    /// Propagates a registration error; the default set is known
    /// collision-free, so this only fails if the set is modified.
    pub fn with_defaults() -> Result<Self, EngineError> {
        let registry = Self::new();
        for symbol in DEFAULT_SYMBOLS {
            registry.register(symbol)?;
        }
        Ok(registry)
    }

    /// Register `symbol`, assigning the next array index.
    ///
    /// Re-registering an identical symbol is idempotent and returns the
    /// existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::FingerprintCollision`] when a different
    /// symbol already owns the fingerprint, or
    /// [`EngineError::SymbolTableFull`] at capacity.
    pub fn register(&self, symbol: &str) -> Result<SymbolInfo, EngineError> {
        let fingerprint = symbol_fingerprint(symbol);
        let mut ordered = self
            .ordered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = self.by_fp.get(&fingerprint) {
            if existing.symbol == symbol {
                return Ok(existing.clone());
            }
            return Err(EngineError::FingerprintCollision {
                symbol: symbol.to_string(),
                existing: existing.symbol.clone(),
                fingerprint,
            });
        }

        if ordered.len() >= MAX_SYMBOLS {
            return Err(EngineError::SymbolTableFull {
                max_symbols: MAX_SYMBOLS,
            });
        }

        let info = SymbolInfo {
            symbol: symbol.to_string(),
            fingerprint,
            index: ordered.len(),
        };
        ordered.push(symbol.to_string());
        self.by_fp.insert(fingerprint, info.clone());
        info!(symbol, fingerprint, index = info.index, "registered symbol");
        Ok(info)
    }

    /// Look up a symbol by fingerprint.
    pub fn lookup_fp(&self, fingerprint: u32) -> Option<SymbolInfo> {
        self.by_fp.get(&fingerprint).map(|entry| entry.clone())
    }

    /// Look up a symbol by name.
    pub fn lookup_symbol(&self, symbol: &str) -> Option<SymbolInfo> {
        self.lookup_fp(symbol_fingerprint(symbol))
            .filter(|info| info.symbol == symbol)
    }

    /// Number of registered symbols.
    pub fn len(&self) -> usize {
        self.ordered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no symbol is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered symbols in index order.
    pub fn symbols(&self) -> Vec<String> {
        self.ordered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
