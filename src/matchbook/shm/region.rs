//! The shared memory-mapped region.
//!
//! [`SharedRegion`] owns the engine-side read-write mapping of the region
//! file and hands out the primitives the queues and snapshot tables are
//! built from: atomic references to the eight header words and raw byte
//! copies in and out of the payload sections.
//!
//! # Ownership map
//!
//! The matching engine exclusively owns writes to every byte of the region
//! except the order-ring tail word and the unpublished order slots in
//! `[tail, tail+1)`, which belong to the submitter side until the tail is
//! release-published. Concurrent readers of the market-data and
//! price-level sections accept one-generation staleness. The region is
//! volatile working memory: the header is trusted across restarts only
//! while `version` is non-zero.

use super::error::RegionError;
use super::layout::{
    H_LAST_UPDATE_TS, H_NEXT_TRADE_ID, H_ORDER_HEAD, H_ORDER_TAIL, H_STATUS, H_TRADE_HEAD,
    H_TRADE_TAIL, H_VERSION, HEADER_SIZE, REGION_SIZE, SCHEMA_VERSION,
};
use memmap2::MmapMut;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Engine status value stored in the header: actively matching.
pub const STATUS_ACTIVE: u64 = 1;
/// Engine status value stored in the header: idle / shut down.
pub const STATUS_IDLE: u64 = 0;

/// The engine-side mapping of the shared region file.
///
/// Cloned via `Arc` into every queue and table that operates on the
/// region. Payload writes go through [`SharedRegion::write_from`], whose
/// safety contract is the ownership map above; header words are atomics.
pub struct SharedRegion {
    /// Keeps the mapping alive; payload access goes through `base`.
    mmap: MmapMut,
    /// Base pointer of the mapping.
    base: *mut u8,
    /// Path of the backing file.
    path: PathBuf,
}

// SAFETY: all mutation goes through raw-pointer copies and atomics whose
// disjoint ownership is guaranteed by the ownership map; the mapping
// itself is never moved or resized after construction.
unsafe impl Send for SharedRegion {}
unsafe impl Sync for SharedRegion {}

impl SharedRegion {
    /// Open or create the region file at `path` and map it read-write.
    ///
    /// A missing or empty file is extended to [`REGION_SIZE`] (sparse, so
    /// untouched pages cost nothing on disk). An existing file of any
    /// other size is refused. A header with `version == 0` is reset and
    /// populated; a non-zero version is adopted as-is.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] if the file cannot be opened, sized, or
    /// mapped, or if an existing file has the wrong size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>, RegionError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| RegionError::Io {
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

        if len == 0 {
            file.set_len(REGION_SIZE as u64).map_err(|e| RegionError::Io {
                message: e.to_string(),
                path: Some(path.clone()),
            })?;
        } else if len != REGION_SIZE as u64 {
            return Err(RegionError::SizeMismatch {
                expected: REGION_SIZE as u64,
                actual: len,
                path,
            });
        }

        // SAFETY: the file is kept at a fixed size and is not truncated
        // externally while the mapping is active (single-deployment file).
        let mut mmap = unsafe {
            MmapMut::map_mut(&file).map_err(|e| RegionError::Io {
                message: e.to_string(),
                path: Some(path.clone()),
            })?
        };

        let base = mmap.as_mut_ptr();
        let region = Self {
            mmap,
            base,
            path,
        };

        if region.version().load(Ordering::Acquire) == 0 {
            region.reset_header();
            info!(path = %region.path.display(), "initialized shared region header");
        } else {
            info!(path = %region.path.display(), "adopted existing shared region header");
        }

        Ok(Arc::new(region))
    }

    /// Reset every header word and stamp the schema version.
    ///
    /// Ring indices become empty rings; `next_trade_id` restarts at 1.
    fn reset_header(&self) {
        for offset in (0..HEADER_SIZE).step_by(8) {
            self.header_word(offset).store(0, Ordering::Relaxed);
        }
        self.header_word(H_NEXT_TRADE_ID).store(1, Ordering::Relaxed);
        self.header_word(H_VERSION)
            .store(SCHEMA_VERSION, Ordering::Release);
    }

    /// Atomic reference to the header word at `offset`.
    fn header_word(&self, offset: usize) -> &AtomicU64 {
        debug_assert!(offset % 8 == 0 && offset + 8 <= HEADER_SIZE);
        // SAFETY: the header occupies the first 64 bytes of a page-aligned
        // mapping, so every word is 8-byte aligned; AtomicU64 is layout-
        // compatible with u64 and the mapping outlives the reference.
        unsafe { &*(self.base.add(offset) as *const AtomicU64) }
    }

    /// Order-ring consumer index (engine-owned).
    pub fn order_head(&self) -> &AtomicU64 {
        self.header_word(H_ORDER_HEAD)
    }

    /// Order-ring producer index (submitter-owned).
    pub fn order_tail(&self) -> &AtomicU64 {
        self.header_word(H_ORDER_TAIL)
    }

    /// Trade-ring consumer index.
    pub fn trade_head(&self) -> &AtomicU64 {
        self.header_word(H_TRADE_HEAD)
    }

    /// Trade-ring producer index (engine-owned).
    pub fn trade_tail(&self) -> &AtomicU64 {
        self.header_word(H_TRADE_TAIL)
    }

    /// Monotonic trade-id counter.
    pub fn next_trade_id(&self) -> &AtomicU64 {
        self.header_word(H_NEXT_TRADE_ID)
    }

    /// Nanosecond timestamp of the engine's last update.
    pub fn last_update_ts(&self) -> &AtomicU64 {
        self.header_word(H_LAST_UPDATE_TS)
    }

    /// Schema version word; non-zero marks an initialized header.
    pub fn version(&self) -> &AtomicU64 {
        self.header_word(H_VERSION)
    }

    /// Engine status word ([`STATUS_ACTIVE`] / [`STATUS_IDLE`]).
    pub fn status(&self) -> &AtomicU64 {
        self.header_word(H_STATUS)
    }

    /// Copy `buf.len()` bytes out of the region starting at `offset`.
    ///
    /// Reads race benignly with snapshot writers: the single-writer rule
    /// plus the ring publication fences guarantee that queue consumers
    /// only ever read fully published slots.
    pub(crate) fn read_into(&self, offset: usize, buf: &mut [u8]) {
        assert!(offset + buf.len() <= REGION_SIZE);
        // SAFETY: bounds checked above; source and destination never
        // overlap (buf is ordinary heap/stack memory).
        unsafe {
            ptr::copy_nonoverlapping(self.base.add(offset), buf.as_mut_ptr(), buf.len());
        }
    }

    /// Copy `buf` into the region at `offset`.
    ///
    /// # Safety
    ///
    /// The caller must hold exclusive write ownership of the target window
    /// per the ownership map: the engine for everything it owns, a
    /// submitter only for the unpublished order slot it is about to
    /// release-publish.
    pub(crate) unsafe fn write_from(&self, offset: usize, buf: &[u8]) {
        assert!(offset + buf.len() <= REGION_SIZE);
        // SAFETY: bounds checked above; exclusivity is the caller's
        // contract.
        unsafe {
            ptr::copy_nonoverlapping(buf.as_ptr(), self.base.add(offset), buf.len());
        }
    }

    /// Flush the mapping to the backing file.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::Io`] if the flush fails.
    pub fn flush(&self) -> Result<(), RegionError> {
        self.mmap.flush().map_err(|e| RegionError::Io {
            message: e.to_string(),
            path: Some(self.path.clone()),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for SharedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRegion")
            .field("path", &self.path)
            .field("size", &REGION_SIZE)
            .field("version", &self.version().load(Ordering::Relaxed))
            .field("status", &self.status().load(Ordering::Relaxed))
            .finish()
    }
}
