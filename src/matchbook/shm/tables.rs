//! Engine-side writers for the dense snapshot arrays in the region.
//!
//! Both tables are written only by the engine thread after each processed
//! order; uncoordinated readers tolerate one-generation staleness. The
//! price-level table is a lossy projection of the in-memory book (prices
//! congruent modulo `MAX_LEVELS` alias one record); readers that need
//! authoritative depth query the book's top-N snapshot instead.

use super::layout::{
    LEVEL_RECORD_SIZE, MARKET_DATA_RECORD_SIZE, level_record_offset, market_data_record_offset,
};
use super::region::SharedRegion;
use crate::matchbook::types::{MarketData, Side};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One price-level record as it lives in the mapped array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    /// The level's price.
    pub price: u64,
    /// Sum of resting quantities at the price.
    pub total_quantity: u64,
    /// Number of resting orders at the price.
    pub order_count: u64,
}

impl LevelRecord {
    /// The record written when a level vanishes from the book.
    #[must_use]
    pub fn cleared(price: u64) -> Self {
        Self {
            price,
            total_quantity: 0,
            order_count: 0,
        }
    }
}

/// Writer/reader for the per-symbol market-data array.
pub struct MarketDataTable {
    region: Arc<SharedRegion>,
}

impl MarketDataTable {
    /// Create a handle over `region`.
    pub fn new(region: Arc<SharedRegion>) -> Self {
        Self { region }
    }

    /// Write the record for symbol index `symbol_index`.
    pub fn write(&self, symbol_index: usize, md: &MarketData) {
        let buf = encode_market_data(md);
        // SAFETY: the engine thread is the sole writer of the market-data
        // section.
        unsafe {
            self.region
                .write_from(market_data_record_offset(symbol_index), &buf);
        }
    }

    /// Read the record for symbol index `symbol_index`.
    pub fn read(&self, symbol_index: usize) -> MarketData {
        let mut buf = [0u8; MARKET_DATA_RECORD_SIZE];
        self.region
            .read_into(market_data_record_offset(symbol_index), &mut buf);
        decode_market_data(&buf)
    }
}

/// Writer/reader for the per-symbol price-level snapshot array.
pub struct PriceLevelTable {
    region: Arc<SharedRegion>,
}

impl PriceLevelTable {
    /// Create a handle over `region`.
    pub fn new(region: Arc<SharedRegion>) -> Self {
        Self { region }
    }

    /// Write the record for `record.price` on `side` of `symbol_index`.
    pub fn write(&self, symbol_index: usize, side: Side, record: &LevelRecord) {
        let buf = encode_level(record);
        // SAFETY: the engine thread is the sole writer of the price-level
        // section.
        unsafe {
            self.region
                .write_from(level_record_offset(symbol_index, side, record.price), &buf);
        }
    }

    /// Read the record that `price` projects onto.
    pub fn read(&self, symbol_index: usize, side: Side, price: u64) -> LevelRecord {
        let mut buf = [0u8; LEVEL_RECORD_SIZE];
        self.region
            .read_into(level_record_offset(symbol_index, side, price), &mut buf);
        decode_level(&buf)
    }
}

pub(crate) fn encode_market_data(md: &MarketData) -> [u8; MARKET_DATA_RECORD_SIZE] {
    let mut buf = [0u8; MARKET_DATA_RECORD_SIZE];
    buf[0..4].copy_from_slice(&md.symbol_fp.to_le_bytes());
    buf[4..12].copy_from_slice(&md.last_price.to_le_bytes());
    buf[12..20].copy_from_slice(&md.last_quantity.to_le_bytes());
    buf[20..28].copy_from_slice(&md.volume_24h.to_le_bytes());
    buf[28..36].copy_from_slice(&md.best_bid.to_le_bytes());
    buf[36..44].copy_from_slice(&md.best_ask.to_le_bytes());
    buf[44..52].copy_from_slice(&md.timestamp.to_le_bytes());
    buf
}

pub(crate) fn decode_market_data(buf: &[u8; MARKET_DATA_RECORD_SIZE]) -> MarketData {
    let u64_at = |at: usize| {
        let mut b = [0u8; 8];
        b.copy_from_slice(&buf[at..at + 8]);
        u64::from_le_bytes(b)
    };
    let mut fp = [0u8; 4];
    fp.copy_from_slice(&buf[0..4]);

    MarketData {
        symbol_fp: u32::from_le_bytes(fp),
        last_price: u64_at(4),
        last_quantity: u64_at(12),
        volume_24h: u64_at(20),
        best_bid: u64_at(28),
        best_ask: u64_at(36),
        timestamp: u64_at(44),
    }
}

pub(crate) fn encode_level(record: &LevelRecord) -> [u8; LEVEL_RECORD_SIZE] {
    let mut buf = [0u8; LEVEL_RECORD_SIZE];
    buf[0..8].copy_from_slice(&record.price.to_le_bytes());
    buf[8..16].copy_from_slice(&record.total_quantity.to_le_bytes());
    buf[16..24].copy_from_slice(&record.order_count.to_le_bytes());
    buf
}

pub(crate) fn decode_level(buf: &[u8; LEVEL_RECORD_SIZE]) -> LevelRecord {
    let u64_at = |at: usize| {
        let mut b = [0u8; 8];
        b.copy_from_slice(&buf[at..at + 8]);
        u64::from_le_bytes(b)
    };
    LevelRecord {
        price: u64_at(0),
        total_quantity: u64_at(8),
        order_count: u64_at(16),
    }
}
