use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet, QoS, SubscribeReasonCode,
};
use shutterctl_api::topic::OFFLINE;
use tokio::sync::mpsc::UnboundedSender;

use super::{Inbound, Transport};
use crate::configs::Gateway;
use crate::errors::TransportError;

const REQUEST_CAPACITY: usize = 64;

/// MQTT client publishing at-least-once.
#[derive(Clone)]
pub struct MqttTransport {
    client: AsyncClient,
}

impl MqttTransport {
    /// Creates the client and its event loop; nothing is sent until the
    /// event loop is polled by [`MqttTransport::pump`].
    pub fn new(gateway: &Gateway, availability_topic: &str) -> (Self, EventLoop) {
        let mut options = MqttOptions::new(&gateway.client_id, &gateway.host, gateway.port);
        options.set_keep_alive(Duration::from_secs(gateway.keep_alive_secs));
        options.set_last_will(LastWill::new(availability_topic, OFFLINE, QoS::AtLeastOnce, true));

        if let Some(auth) = &gateway.auth {
            options.set_credentials(&auth.username, &auth.password);
        }

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);

        (Self { client }, event_loop)
    }

    /// Drives the connection and forwards every inbound publish to `sender`.
    ///
    /// Returns once the client disconnects or the receiver is dropped, and
    /// fails on the first connection error or rejected subscription.
    pub async fn pump(mut event_loop: EventLoop, sender: UnboundedSender<Inbound>) -> Result<(), TransportError> {
        loop {
            match event_loop.poll().await? {
                Event::Incoming(Packet::ConnAck(ack)) => {
                    tracing::info!("connected to broker: {:?}", ack.code);
                }
                Event::Incoming(Packet::SubAck(ack)) => {
                    if ack.return_codes.iter().any(|c| matches!(c, SubscribeReasonCode::Failure)) {
                        return Err(TransportError::NotAcknowledged(format!("subscription {}", ack.pkid)));
                    }
                }
                Event::Incoming(Packet::Publish(publish)) => {
                    let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                    tracing::trace!("Receive: {} {}", publish.topic, payload);

                    if sender.send(Inbound::new(publish.topic, payload)).is_err() {
                        return Ok(());
                    }
                }
                Event::Outgoing(Outgoing::Disconnect) => return Ok(()),
                _ => {}
            }
        }
    }

    pub async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(self.client.disconnect().await?)
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<(), TransportError> {
        tracing::trace!("Send: {} {}", topic, payload);

        Ok(self.client.publish(topic, QoS::AtLeastOnce, retain, payload).await?)
    }

    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.client.subscribe(topic, QoS::AtLeastOnce).await?;

        tracing::debug!("subscribe topic {}", topic);

        Ok(())
    }
}
