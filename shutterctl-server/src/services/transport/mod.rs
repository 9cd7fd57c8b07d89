mod mqtt;

pub use mqtt::*;

use async_trait::async_trait;

use crate::errors::TransportError;

/// A message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub topic: String,
    pub payload: String,
}

impl Inbound {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Outbound half of the pub/sub transport.
///
/// Inbound messages arrive separately over a channel so that a single
/// consumer owns all entity state.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<(), TransportError>;

    async fn subscribe(&self, topic: &str) -> Result<(), TransportError>;
}
