pub mod api;
#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::BatchConfig};

pub use api::{Options, StocksHistorical, StocksSnapshot};
pub use core::{etl::EtlEngine, pipeline::TerminalPipeline};
pub use domain::contract::{
    DateRange, GreeksInputs, OptionChain, OptionContract, Right, TimeWindow, Venue,
};
pub use domain::model::{FetchOutput, Table};
pub use utils::error::{EtlError, Result};
