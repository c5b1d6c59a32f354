// Domain layer: request/response/table models and the ports the engine runs on.

pub mod contract;
pub mod model;
pub mod ports;
