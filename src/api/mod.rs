//! Typed wrappers over the terminal's REST endpoints.
//!
//! Each wrapper method validates its inputs, builds a
//! [`DataRequest`](crate::core::DataRequest) and runs
//! it through the engine. Nothing reaches the network when validation fails.

pub mod options;
pub mod stocks;
pub mod stocks_historical;

pub use options::Options;
pub use stocks::StocksSnapshot;
pub use stocks_historical::StocksHistorical;

use crate::core::etl::EtlEngine;
use crate::core::Pipeline;

impl<P: Pipeline> EtlEngine<P> {
    pub fn stocks_snapshot(&self) -> StocksSnapshot<'_, P> {
        StocksSnapshot::new(self)
    }

    pub fn stocks_historical(&self) -> StocksHistorical<'_, P> {
        StocksHistorical::new(self)
    }

    pub fn options(&self) -> Options<'_, P> {
        Options::new(self)
    }
}
