pub mod control;
pub mod storage;
pub mod transport;

pub use control::ControlError;
pub use storage::StorageError;
pub use transport::TransportError;
