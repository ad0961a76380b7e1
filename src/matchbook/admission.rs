//! Admission gateway: the thin broker between submitter threads and the
//! order ring.
//!
//! The gateway assigns order identifiers, stamps timestamps, resolves
//! symbol fingerprints, validates, and serializes every ring offer under
//! one mutex — that mutex is what turns any number of submitter threads
//! into the single producer the ring contract requires.

use crate::matchbook::error::SubmitError;
use crate::matchbook::registry::SymbolRegistry;
use crate::matchbook::shm::{OrderRing, SharedRegion};
use crate::matchbook::types::{Order, OrderKind, Side};
use crate::utils::current_time_nanos;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

/// Serializes submissions onto the order ring.
pub struct OrderGateway {
    ring: OrderRing,
    registry: Arc<SymbolRegistry>,
    next_order_id: AtomicU64,
    offer_lock: Mutex<()>,
}

impl OrderGateway {
    /// Create a gateway over `region` using `registry` for symbol checks.
    pub fn new(region: Arc<SharedRegion>, registry: Arc<SymbolRegistry>) -> Self {
        Self {
            ring: OrderRing::new(region),
            registry,
            next_order_id: AtomicU64::new(1),
            offer_lock: Mutex::new(()),
        }
    }

    /// Submit a limit order.
    ///
    /// # Errors
    ///
    /// Returns a [`SubmitError`] for an unregistered symbol, a
    /// non-positive quantity or price, or a full ring.
    pub fn submit_limit(
        &self,
        symbol: &str,
        side: Side,
        price: u64,
        quantity: u64,
    ) -> Result<u64, SubmitError> {
        self.submit(symbol, side, OrderKind::Limit, price, quantity)
    }

    /// Submit a market order.
    ///
    /// # Errors
    ///
    /// Returns a [`SubmitError`] for an unregistered symbol, a
    /// non-positive quantity, or a full ring.
    pub fn submit_market(
        &self,
        symbol: &str,
        side: Side,
        quantity: u64,
    ) -> Result<u64, SubmitError> {
        self.submit(symbol, side, OrderKind::Market, 0, quantity)
    }

    /// Validate, stamp, and enqueue one order; returns the assigned id.
    fn submit(
        &self,
        symbol: &str,
        side: Side,
        kind: OrderKind,
        price: u64,
        quantity: u64,
    ) -> Result<u64, SubmitError> {
        let info = self
            .registry
            .lookup_symbol(symbol)
            .ok_or_else(|| SubmitError::UnknownSymbol {
                symbol: symbol.to_string(),
            })?;

        if quantity == 0 {
            return Err(SubmitError::InvalidQuantity { quantity });
        }
        if kind == OrderKind::Limit && price == 0 {
            return Err(SubmitError::InvalidPrice { price });
        }

        let order = Order {
            id: self.next_order_id.fetch_add(1, Ordering::Relaxed),
            symbol_fp: info.fingerprint,
            side,
            kind,
            price,
            quantity,
            timestamp: current_time_nanos(),
        };

        // One producer at a time: the lock serializes the tail.
        let _guard = self
            .offer_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !self.ring.offer(&order) {
            return Err(SubmitError::RingFull);
        }

        trace!(
            order_id = order.id,
            symbol,
            side = %side,
            kind = %kind,
            price,
            quantity,
            "order admitted"
        );
        Ok(order.id)
    }

    /// Number of admitted orders waiting in the ring.
    pub fn pending(&self) -> usize {
        self.ring.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchbook::shm::layout::order_slot_offset;

    fn gateway() -> (tempfile::TempDir, OrderGateway, Arc<SharedRegion>) {
        let dir = tempfile::tempdir().unwrap_or_else(|_| panic!("tempdir"));
        let region = SharedRegion::open(dir.path().join("region"))
            .unwrap_or_else(|_| panic!("open region"));
        let registry = Arc::new(
            SymbolRegistry::with_defaults().unwrap_or_else(|_| panic!("defaults")),
        );
        (dir, OrderGateway::new(region.clone(), registry), region)
    }

    #[test]
    fn test_submit_assigns_sequential_ids() {
        let (_dir, gateway, _region) = gateway();
        let first = gateway.submit_limit("BTC-USD", Side::Buy, 50_000, 1);
        let second = gateway.submit_limit("BTC-USD", Side::Sell, 50_100, 1);
        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(2));
        assert_eq!(gateway.pending(), 2);
    }

    #[test]
    fn test_unknown_symbol_is_rejected_before_the_ring() {
        let (_dir, gateway, _region) = gateway();
        let result = gateway.submit_limit("DOGE-USD", Side::Buy, 100, 1);
        assert_eq!(
            result,
            Err(SubmitError::UnknownSymbol {
                symbol: "DOGE-USD".to_string()
            })
        );
        assert_eq!(gateway.pending(), 0);
    }

    #[test]
    fn test_zero_quantity_and_zero_priced_limit_rejected() {
        let (_dir, gateway, _region) = gateway();
        assert_eq!(
            gateway.submit_limit("BTC-USD", Side::Buy, 50_000, 0),
            Err(SubmitError::InvalidQuantity { quantity: 0 })
        );
        assert_eq!(
            gateway.submit_limit("BTC-USD", Side::Buy, 0, 1),
            Err(SubmitError::InvalidPrice { price: 0 })
        );
        // A market order carries no price and is accepted at price 0.
        assert!(gateway.submit_market("BTC-USD", Side::Buy, 1).is_ok());
    }

    #[test]
    fn test_admitted_order_is_stamped_and_fingerprinted() {
        use crate::matchbook::types::symbol_fingerprint;

        let (_dir, gateway, region) = gateway();
        gateway
            .submit_limit("ETH-USD", Side::Sell, 3_000, 4)
            .unwrap_or_else(|_| panic!("submit"));

        // Read the raw slot back: id, fingerprint and timestamp are set.
        let mut buf = [0u8; 44];
        region.read_into(order_slot_offset(0), &mut buf);
        let mut field = [0u8; 8];
        field.copy_from_slice(&buf[0..8]);
        assert_eq!(u64::from_le_bytes(field), 1);
        let mut fp = [0u8; 4];
        fp.copy_from_slice(&buf[8..12]);
        assert_eq!(u32::from_le_bytes(fp), symbol_fingerprint("ETH-USD"));
        field.copy_from_slice(&buf[36..44]);
        assert!(u64::from_le_bytes(field) > 0);
    }

    #[test]
    fn test_full_ring_surfaces_transient_failure() {
        let (_dir, gateway, region) = gateway();
        // Fake a full ring: head just ahead of tail.
        region.order_head().store(1, Ordering::Release);
        region.order_tail().store(0, Ordering::Release);

        let result = gateway.submit_limit("BTC-USD", Side::Buy, 50_000, 1);
        assert_eq!(result, Err(SubmitError::RingFull));
    }
}
