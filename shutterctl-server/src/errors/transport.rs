#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    #[error("Inbound channel closed")]
    ChannelClosed,

    #[error("{0} was not acknowledged")]
    NotAcknowledged(String),
}
