//! Command execution shared by the `theta-etl` and `batch_download` binaries.

pub mod batch;
pub mod dispatch;
