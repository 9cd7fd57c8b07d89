use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use shutterctl_api::topic::{actuator_calibration_topic, actuator_command_topic};
use tokio::time::{self, Instant};
use uuid::Uuid;

use crate::command::{ActuatorRequest, parse_request};
use crate::settings::Settings;
use crate::simulate::Shutter;

mod command;
pub mod settings;
mod simulate;

pub async fn run(settings: &Arc<Settings>) -> Result<(), Box<dyn Error>> {
    let gateway = &settings.gateway;
    let client_id = format!("{}-{}", gateway.client_id, Uuid::new_v4().simple());

    let mut options = MqttOptions::new(client_id, &gateway.host, gateway.port);
    options.set_keep_alive(Duration::from_secs(5));
    if let (Some(username), Some(password)) = (&gateway.username, &gateway.password) {
        options.set_credentials(username, password);
    }

    let (client, mut event_loop) = AsyncClient::new(options, 64);

    let topics: Vec<String> = settings.actuators.iter().map(|a| a.topic.clone()).collect();
    let mut shutters: Vec<Shutter> = settings
        .actuators
        .iter()
        .map(|a| Shutter::new(a.time_up, a.time_down))
        .collect();

    for topic in &topics {
        client.subscribe(actuator_command_topic(topic), QoS::AtLeastOnce).await?;
        client.subscribe(actuator_calibration_topic(topic), QoS::AtLeastOnce).await?;
        tracing::info!("simulating {}", topic);
    }

    let mut interval = time::interval(Duration::from_millis(settings.mock.tick_ms));
    let mut last_tick = Instant::now();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = event_loop.poll() => {
                let Event::Incoming(Packet::Publish(publish)) = event? else {
                    continue;
                };
                let payload = String::from_utf8_lossy(&publish.payload);
                tracing::debug!("Receive: {} {}", publish.topic, payload);

                let Some((index, request)) = parse_request(&topics, &publish.topic, &payload) else {
                    continue;
                };
                let Some(shutter) = shutters.get_mut(index) else {
                    continue;
                };

                match request {
                    ActuatorRequest::Move(command) => shutter.apply(command, motor_speed(settings.mock.jitter)),
                    ActuatorRequest::Calibrate(time_up) => shutter.calibrate(time_up),
                }
                report(&client, &topics[index], shutter)?;
            },
            _ = interval.tick() => {
                let elapsed = last_tick.elapsed();
                last_tick = Instant::now();

                for (topic, shutter) in topics.iter().zip(shutters.iter_mut()) {
                    if shutter.is_moving() {
                        shutter.advance(elapsed);
                        report(&client, topic, shutter)?;
                    }
                }
            },
            _ = &mut shutdown => {
                client.disconnect().await?;
                return Ok(());
            }
        }
    }
}

/// Random speed factor around 1 so position drift shows up over time.
fn motor_speed(jitter: f64) -> f64 {
    let jitter = jitter.abs();
    1.0 + rand::rng().random_range(-jitter..=jitter)
}

/// Publishes without waiting, since this task also drives the event loop.
fn report(client: &AsyncClient, topic: &str, shutter: &Shutter) -> Result<(), Box<dyn Error>> {
    let payload = shutter.report().encode()?;
    tracing::debug!("Send: {} {}", topic, payload);

    client.try_publish(topic, QoS::AtLeastOnce, false, payload)?;

    Ok(())
}
