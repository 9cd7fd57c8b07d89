mod settings;
mod storage;

pub use settings::{Gateway, GatewayAuth, Logger, Node, Settings, State, Timing, WindowConfig};
pub use storage::{StateStore, TIME_KEY};
