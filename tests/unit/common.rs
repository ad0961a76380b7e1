//! Shared fixture: a complete venue over a temporary mapped region.

use matchbook_rs::prelude::*;
use std::sync::Arc;

/// A gateway, an engine, and both rings over one temporary region file.
///
/// The region file is sparse, so the full layout costs nothing on disk
/// beyond the pages the tests actually touch.
pub struct Venue {
    _dir: tempfile::TempDir,
    pub region: Arc<SharedRegion>,
    pub registry: Arc<SymbolRegistry>,
    pub gateway: OrderGateway,
    pub engine: MatchingEngine,
    pub trades: TradeRing,
}

impl Venue {
    pub fn new() -> Self {
        // Engine tracing into the captured test output; ignore the error
        // when a previous test already installed the subscriber.
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let dir = tempfile::tempdir().expect("tempdir");
        let region = SharedRegion::open(dir.path().join("region")).expect("open region");
        let registry = Arc::new(SymbolRegistry::with_defaults().expect("default symbols"));
        let gateway = OrderGateway::new(region.clone(), registry.clone());
        let engine = MatchingEngine::new(region.clone(), registry.clone());
        let trades = TradeRing::new(region.clone());
        Self {
            _dir: dir,
            region,
            registry,
            gateway,
            engine,
            trades,
        }
    }

    /// Process every order currently in the intake ring.
    pub fn drain(&mut self) {
        while self.engine.poll_once().expect("poll_once") {}
    }

    /// The BTC-USD book, which every scenario trades on.
    pub fn btc_book(&self) -> &OrderBook {
        self.engine
            .book(symbol_fingerprint("BTC-USD"))
            .expect("BTC-USD book exists")
    }

    /// Collect all trades currently in the trade ring.
    pub fn collect_trades(&self) -> Vec<Trade> {
        let mut out = Vec::new();
        while let Some(trade) = self.trades.poll() {
            out.push(trade);
        }
        out
    }
}

/// The `(price, quantity, order_count)` shape of one side, best first.
pub fn side_shape(book: &OrderBook, side: Side) -> Vec<(u64, u64, u64)> {
    book.depth(side, usize::MAX)
        .into_iter()
        .map(|level| (level.price, level.quantity, level.order_count))
        .collect()
}
