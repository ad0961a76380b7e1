//! Byte-exact layout of the shared mapped region.
//!
//! The region is one contiguous file:
//!
//! ```text
//! Header (64 B)
//! ‖ OrderRing  (N_ORDER  slots × 44 B)
//! ‖ TradeRing  (N_TRADE  slots × 52 B)
//! ‖ MarketData (MAX_SYMBOLS records × 52 B)
//! ‖ PriceLevels (MAX_SYMBOLS × 2 sides × MAX_LEVELS records × 24 B)
//! ```
//!
//! All multi-byte integers are little-endian. The eight header words sit at
//! fixed 8-byte-aligned offsets and are accessed atomically; ring slots and
//! array records are plain byte windows protected by the ring publication
//! fences and the single-writer ownership rule.

use crate::matchbook::types::Side;

/// Size of the region header in bytes.
pub const HEADER_SIZE: usize = 64;

/// Header word: order-ring consumer index (written by the engine).
pub const H_ORDER_HEAD: usize = 0;
/// Header word: order-ring producer index (written by submitters).
pub const H_ORDER_TAIL: usize = 8;
/// Header word: trade-ring consumer index.
pub const H_TRADE_HEAD: usize = 16;
/// Header word: trade-ring producer index (written by the engine).
pub const H_TRADE_TAIL: usize = 24;
/// Header word: next trade identifier, initialized to 1.
pub const H_NEXT_TRADE_ID: usize = 32;
/// Header word: nanosecond timestamp of the engine's last update.
pub const H_LAST_UPDATE_TS: usize = 40;
/// Header word: schema version; non-zero marks an initialized header.
pub const H_VERSION: usize = 48;
/// Header word: engine status (1 = active, 0 = idle).
pub const H_STATUS: usize = 56;

/// Schema version written into `H_VERSION` on initialization.
pub const SCHEMA_VERSION: u64 = 1;

/// Number of order-ring slots.
pub const N_ORDER: usize = 1 << 20;
/// Size of one order-ring slot in bytes:
/// `order_id u64 ‖ symbol_fp u32 ‖ side u32 ‖ kind u32 ‖ price u64 ‖
/// quantity u64 ‖ timestamp u64`.
pub const ORDER_SLOT_SIZE: usize = 8 + 4 + 4 + 4 + 8 + 8 + 8;

/// Byte offset of the order ring.
pub const ORDER_RING_OFFSET: usize = HEADER_SIZE;
/// Total bytes occupied by the order ring.
pub const ORDER_RING_BYTES: usize = N_ORDER * ORDER_SLOT_SIZE;

/// Number of trade-ring slots.
pub const N_TRADE: usize = 1 << 20;
/// Size of one trade-ring slot in bytes:
/// `trade_id u64 ‖ buy_order_id u64 ‖ sell_order_id u64 ‖ price u64 ‖
/// quantity u64 ‖ timestamp u64 ‖ symbol_fp u32`.
pub const TRADE_SLOT_SIZE: usize = 8 + 8 + 8 + 8 + 8 + 8 + 4;

/// Byte offset of the trade ring.
pub const TRADE_RING_OFFSET: usize = ORDER_RING_OFFSET + ORDER_RING_BYTES;
/// Total bytes occupied by the trade ring.
pub const TRADE_RING_BYTES: usize = N_TRADE * TRADE_SLOT_SIZE;

/// Maximum number of registered symbols.
pub const MAX_SYMBOLS: usize = 1000;
/// Size of one market-data record in bytes:
/// `symbol_fp u32 ‖ last_price u64 ‖ last_quantity u64 ‖ volume_24h u64 ‖
/// best_bid u64 ‖ best_ask u64 ‖ timestamp u64`.
pub const MARKET_DATA_RECORD_SIZE: usize = 4 + 8 + 8 + 8 + 8 + 8 + 8;

/// Byte offset of the market-data array.
pub const MARKET_DATA_OFFSET: usize = TRADE_RING_OFFSET + TRADE_RING_BYTES;
/// Total bytes occupied by the market-data array.
pub const MARKET_DATA_BYTES: usize = MAX_SYMBOLS * MARKET_DATA_RECORD_SIZE;

/// Number of price-level snapshot records per symbol per side.
pub const MAX_LEVELS: usize = 10_000;
/// Size of one price-level record in bytes:
/// `price u64 ‖ total_quantity u64 ‖ order_count u64`.
pub const LEVEL_RECORD_SIZE: usize = 8 + 8 + 8;

/// Byte offset of the price-level snapshot array.
pub const LEVELS_OFFSET: usize = MARKET_DATA_OFFSET + MARKET_DATA_BYTES;
/// Total bytes occupied by the price-level snapshot array.
pub const LEVELS_BYTES: usize = MAX_SYMBOLS * 2 * MAX_LEVELS * LEVEL_RECORD_SIZE;

/// Total size of the mapped region in bytes (≈ 554 MiB with defaults).
pub const REGION_SIZE: usize = LEVELS_OFFSET + LEVELS_BYTES;

const _: () = assert!(ORDER_SLOT_SIZE == 44);
const _: () = assert!(TRADE_SLOT_SIZE == 52);
const _: () = assert!(MARKET_DATA_RECORD_SIZE == 52);
const _: () = assert!(REGION_SIZE == 580_715_360);

/// Byte offset of order-ring slot `index`.
#[inline]
#[must_use]
pub fn order_slot_offset(index: usize) -> usize {
    debug_assert!(index < N_ORDER);
    ORDER_RING_OFFSET + index * ORDER_SLOT_SIZE
}

/// Byte offset of trade-ring slot `index`.
#[inline]
#[must_use]
pub fn trade_slot_offset(index: usize) -> usize {
    debug_assert!(index < N_TRADE);
    TRADE_RING_OFFSET + index * TRADE_SLOT_SIZE
}

/// Byte offset of the market-data record for symbol index `symbol_index`.
#[inline]
#[must_use]
pub fn market_data_record_offset(symbol_index: usize) -> usize {
    debug_assert!(symbol_index < MAX_SYMBOLS);
    MARKET_DATA_OFFSET + symbol_index * MARKET_DATA_RECORD_SIZE
}

/// Byte offset of the price-level record for `(symbol_index, side, price)`.
///
/// The bid block of a symbol precedes its ask block; within a side the
/// record index is `price % MAX_LEVELS`. The projection is lossy: distinct
/// prices congruent modulo [`MAX_LEVELS`] share a record.
#[inline]
#[must_use]
pub fn level_record_offset(symbol_index: usize, side: Side, price: u64) -> usize {
    debug_assert!(symbol_index < MAX_SYMBOLS);
    let side_block = match side {
        Side::Buy => symbol_index * 2,
        Side::Sell => symbol_index * 2 + 1,
    };
    let slot = (price % MAX_LEVELS as u64) as usize;
    LEVELS_OFFSET + (side_block * MAX_LEVELS + slot) * LEVEL_RECORD_SIZE
}
