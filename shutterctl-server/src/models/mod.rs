mod registry;
mod window;

pub use registry::{Contact, Registry, Route};
pub use window::WindowAggregate;

/// Index of a window in the registry, in configuration order.
pub type WindowId = usize;
