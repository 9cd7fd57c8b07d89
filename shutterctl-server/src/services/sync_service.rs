use std::sync::Arc;
use std::time::Duration;

use shutterctl_api::models::{CoverInput, FULLY_OPEN, Override, RainLevel};
use shutterctl_api::topic::{OFFLINE, ONLINE};

use crate::configs::{StateStore, Timing};
use crate::entities::Entity;
use crate::errors::ControlError;
use crate::models::{Contact, Registry, Route, WindowAggregate, WindowId};
use crate::services::calibration::{self, ActuatorStep};
use crate::services::resolver;
use crate::services::transport::{Inbound, Transport};

/// Outbound side of the synchronization layer.
struct Publisher {
    transport: Arc<dyn Transport>,
    timing: Timing,
}

impl Publisher {
    async fn state(&self, entity: &dyn Entity) -> Result<(), ControlError> {
        if let Some((topic, payload)) = entity.state_message() {
            self.transport.publish(topic, payload.to_string(), false).await?;
        }
        Ok(())
    }

    async fn actuate(&self, window: &WindowAggregate, steps: Vec<ActuatorStep>) -> Result<(), ControlError> {
        for step in steps {
            match step {
                ActuatorStep::Calibrate(time) => {
                    tracing::debug!("Calibrating cover {} with {}", window.name(), time);
                    self.transport
                        .publish(&window.calibration_topic(), time.to_string(), false)
                        .await?;
                }
                ActuatorStep::Settle => {
                    tokio::time::sleep(Duration::from_millis(self.timing.calibration_settle_ms)).await;
                }
                ActuatorStep::Command(command) => {
                    self.transport.publish(&window.command_topic(), command.encode()?, false).await?;
                }
            }
        }
        Ok(())
    }
}

/// Keeps the entities of every window consistent with inbound messages.
///
/// Owns the registry outright, so handling one message (including the
/// recomputation it triggers) finishes before the next one starts.
pub struct SyncService {
    registry: Registry,
    store: StateStore,
    publisher: Publisher,
}

impl SyncService {
    /// Restores every entity from `store` before anything is published.
    pub fn new(mut registry: Registry, store: StateStore, transport: Arc<dyn Transport>, timing: Timing) -> Self {
        registry.initialize(&store);

        Self {
            registry,
            store,
            publisher: Publisher { transport, timing },
        }
    }

    /// Subscribes, announces every entity and marks the node online.
    pub async fn start(&self) -> Result<(), ControlError> {
        for topic in self.registry.topics() {
            self.publisher.transport.subscribe(topic).await?;
        }

        self.announce().await?;

        self.publisher
            .transport
            .publish(&self.registry.ctx.availability_topic, ONLINE.to_string(), true)
            .await?;
        tracing::info!("{} is available", self.registry.ctx.node_id);

        Ok(())
    }

    /// Publishes every discovery descriptor, waits, then republishes state.
    pub async fn announce(&self) -> Result<(), ControlError> {
        let ctx = &self.registry.ctx;
        let entities = self.registry.entities();

        for entity in &entities {
            let descriptor = entity.discovery(ctx).encode()?;
            self.publisher
                .transport
                .publish(&entity.discovery_topic(ctx), descriptor, true)
                .await?;
        }

        tokio::time::sleep(Duration::from_millis(self.publisher.timing.discovery_delay_ms)).await;

        for entity in &entities {
            self.publisher.state(*entity).await?;
        }

        tracing::info!("announced {} entities", entities.len());

        Ok(())
    }

    pub async fn handle(&mut self, inbound: &Inbound) -> Result<(), ControlError> {
        let routes = self.registry.routes(&inbound.topic).to_vec();

        if routes.is_empty() {
            tracing::debug!("No entity listens on {}", inbound.topic);
        }

        for route in routes {
            self.dispatch(route, &inbound.payload).await?;
        }

        Ok(())
    }

    async fn dispatch(&mut self, route: Route, payload: &str) -> Result<(), ControlError> {
        match route {
            Route::RainCommand => self.on_rain(payload).await,
            Route::AutomationCommand(id) => {
                let window = self.registry.window_mut(id)?;
                window.automation.apply_update(payload, &self.store);
                self.publisher.state(&window.automation).await?;

                self.recompute(id).await
            }
            Route::ScheduledCommand(id) => self.on_schedule(id, payload).await,
            Route::ManualCommand(id) => self.on_manual(id, payload).await,
            Route::ContactState(id, contact) => {
                let window = self.registry.window_mut(id)?;
                let sensor = match contact {
                    Contact::Open => window.window_open_sensor.as_mut(),
                    Contact::Tilted => window.window_tilted_sensor.as_mut(),
                };
                if let Some(sensor) = sensor {
                    sensor.on_external_message(payload, &self.store);
                }

                self.recompute(id).await
            }
            Route::ActuatorState(id) => {
                let window = self.registry.window_mut(id)?;
                if window.output_cover.on_external_message(payload, &self.store) {
                    tracing::debug!("Cover {} reports {}", window.name(), window.output_cover.current_value());
                }
                window.manual_cover.on_external_message(payload, &self.store);

                Ok(())
            }
        }
    }

    async fn on_rain(&mut self, payload: &str) -> Result<(), ControlError> {
        let level: RainLevel = match payload.parse() {
            Ok(level) => level,
            Err(e) => {
                tracing::warn!("Ignoring rain input {:?}: {}", payload, e);
                return self.publisher.state(&self.registry.rain_input).await;
            }
        };

        self.registry.rain_input.apply_update(level.as_str(), &self.store);
        self.publisher.state(&self.registry.rain_input).await?;

        for id in 0..self.registry.windows.len() {
            self.recompute(id).await?;
        }

        Ok(())
    }

    async fn on_schedule(&mut self, id: WindowId, payload: &str) -> Result<(), ControlError> {
        let window = self.registry.window_mut(id)?;

        window
            .scheduled_cover
            .merge(CoverInput::parse(payload).into_state_update(), &self.store);
        let position = window.scheduled_cover.position();
        window.scheduled_value.apply_update(&position.to_string(), &self.store);

        self.publisher.state(&window.scheduled_cover).await?;
        self.publisher.state(&window.scheduled_value).await?;

        if window.automation.is_on() {
            window.manual_value.apply_update("", &self.store);
            self.publisher.state(&window.manual_value).await?;
        }

        self.recompute(id).await
    }

    async fn on_manual(&mut self, id: WindowId, payload: &str) -> Result<(), ControlError> {
        let window = self.registry.window_mut(id)?;

        // Fully open is reserved for recalibration, so a manual open stops one short.
        let request = match CoverInput::parse(payload).requested_position() {
            None => Override::Stop,
            Some(FULLY_OPEN) if window.output_cover.position() < FULLY_OPEN - 1 => Override::Position(FULLY_OPEN - 1),
            Some(position) => Override::Position(position),
        };

        window.manual_value.apply_update(&request.to_state(), &self.store);
        self.publisher.state(&window.manual_value).await?;

        self.recompute(id).await
    }

    /// Resolves the window's target and drives its actuator towards it.
    pub async fn recompute(&mut self, id: WindowId) -> Result<(), ControlError> {
        let rain = self.registry.rain_level();
        let window = self.registry.window_mut(id)?;

        let inputs = window.inputs(rain);
        let resolution = resolver::resolve(&inputs, &window.thresholds);

        window
            .window_open_state
            .apply_update(&inputs.opening.code().to_string(), &self.store);
        window
            .window_open_value
            .apply_update(&resolution.safety.to_state(), &self.store);
        window.rain_value.apply_update(&resolution.rain.to_state(), &self.store);
        window
            .output_value
            .apply_update(&resolution.target.to_state(), &self.store);

        for sensor in [
            &window.window_open_state,
            &window.window_open_value,
            &window.rain_value,
            &window.output_value,
        ] {
            self.publisher.state(sensor).await?;
        }

        let current = window.output_cover.position();
        let offset = self.publisher.timing.calibration_offset;

        match calibration::plan(resolution.command, current, &window.calibration, offset) {
            Some(steps) => {
                tracing::info!(
                    "Updating cover {}: current={} target={}",
                    window.name(),
                    current,
                    resolution.command
                );
                self.publisher.actuate(window, steps).await
            }
            None => {
                tracing::debug!(
                    "Skipping cover {}: current={} target={:?}",
                    window.name(),
                    current,
                    resolution.command
                );
                Ok(())
            }
        }
    }

    /// Flushes the store and marks the node offline.
    ///
    /// A failed flush is logged; only the availability publish can fail.
    pub async fn shutdown(&self) -> Result<(), ControlError> {
        match self.store.flush() {
            Ok(()) => tracing::info!("states flushed"),
            Err(e) => tracing::error!("Failed to flush states: {}", e),
        }

        self.publisher
            .transport
            .publish(&self.registry.ctx.availability_topic, OFFLINE.to_string(), true)
            .await?;

        Ok(())
    }
}
