pub mod calibration;
pub mod resolver;
pub mod transport;

mod snapshot_service;
mod sync_service;

pub use snapshot_service::*;
pub use sync_service::*;
