//! Read-only access to the region for uncoordinated market-data readers.
//!
//! A [`RegionReader`] maps the region file read-only and serves point
//! queries over the market-data and price-level arrays. No coordination
//! with the engine takes place: a reader may observe a record one
//! generation stale, and the price-level array is a lossy projection —
//! authoritative depth comes from the book's own snapshot, not from here.

use super::error::RegionError;
use super::layout::{
    H_LAST_UPDATE_TS, H_STATUS, H_VERSION, HEADER_SIZE, LEVEL_RECORD_SIZE,
    MARKET_DATA_RECORD_SIZE, MAX_SYMBOLS, REGION_SIZE, level_record_offset,
    market_data_record_offset,
};
use super::tables::{LevelRecord, decode_level, decode_market_data};
use crate::matchbook::types::{MarketData, Side};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// A read-only mapping of the region file.
pub struct RegionReader {
    mmap: Mmap,
    path: PathBuf,
}

impl RegionReader {
    /// Map the region file at `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] if the file cannot be opened or mapped, or
    /// has the wrong size for the compiled layout.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RegionError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| RegionError::Io {
            message: e.to_string(),
            path: Some(path.clone()),
        })?;

        let len = file
            .metadata()
            .map_err(|e| RegionError::Io {
                message: e.to_string(),
                path: Some(path.clone()),
            })?
            .len();
        if len != REGION_SIZE as u64 {
            return Err(RegionError::SizeMismatch {
                expected: REGION_SIZE as u64,
                actual: len,
                path,
            });
        }

        // SAFETY: read-only mapping; the engine keeps the file at a fixed
        // size for its lifetime.
        let mmap = unsafe {
            Mmap::map(&file).map_err(|e| RegionError::Io {
                message: e.to_string(),
                path: Some(path.clone()),
            })?
        };

        Ok(Self { mmap, path })
    }

    /// Atomically load the header word at `offset`.
    fn header_word(&self, offset: usize) -> u64 {
        debug_assert!(offset % 8 == 0 && offset + 8 <= HEADER_SIZE);
        // SAFETY: 8-byte-aligned word inside a page-aligned mapping;
        // loads on a read-only mapping are fine, stores never happen here.
        let atom = unsafe { &*(self.mmap.as_ptr().add(offset) as *const AtomicU64) };
        atom.load(Ordering::Acquire)
    }

    /// Schema version; zero means the region was never initialized.
    pub fn version(&self) -> u64 {
        self.header_word(H_VERSION)
    }

    /// Engine status (1 = active, 0 = idle).
    pub fn status(&self) -> u64 {
        self.header_word(H_STATUS)
    }

    /// Nanosecond timestamp of the engine's last update.
    pub fn last_update_ts(&self) -> u64 {
        self.header_word(H_LAST_UPDATE_TS)
    }

    /// Market data for symbol index `symbol_index`.
    pub fn market_data(&self, symbol_index: usize) -> MarketData {
        let offset = market_data_record_offset(symbol_index);
        let mut buf = [0u8; MARKET_DATA_RECORD_SIZE];
        buf.copy_from_slice(&self.mmap[offset..offset + MARKET_DATA_RECORD_SIZE]);
        decode_market_data(&buf)
    }

    /// Locate a symbol's market data by fingerprint.
    ///
    /// Scans the dense array; zero-fingerprint (unoccupied) records never
    /// match a real symbol because the registry refuses empty symbols.
    pub fn find_symbol(&self, symbol_fp: u32) -> Option<(usize, MarketData)> {
        (0..MAX_SYMBOLS)
            .map(|index| (index, self.market_data(index)))
            .find(|(_, md)| md.symbol_fp == symbol_fp && symbol_fp != 0)
    }

    /// The price-level record that `price` projects onto.
    pub fn level(&self, symbol_index: usize, side: Side, price: u64) -> LevelRecord {
        let offset = level_record_offset(symbol_index, side, price);
        let mut buf = [0u8; LEVEL_RECORD_SIZE];
        buf.copy_from_slice(&self.mmap[offset..offset + LEVEL_RECORD_SIZE]);
        decode_level(&buf)
    }

    /// Path of the mapped file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for RegionReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionReader")
            .field("path", &self.path)
            .field("version", &self.version())
            .field("status", &self.status())
            .finish()
    }
}
