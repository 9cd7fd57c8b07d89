use shutterctl_api::discovery::{DeviceInfo, MANUFACTURER, WINDOW_MODEL};
use shutterctl_api::models::{Override, RainLevel, WindowOpening, parse_position};
use shutterctl_api::topic;

use super::WindowId;
use crate::configs::{StateStore, WindowConfig};
use crate::entities::{BinarySensor, Cover, Entity, NodeContext, Sensor, Switch};
use crate::services::calibration::Calibration;
use crate::services::resolver::{Inputs, Thresholds};

/// Entities and static configuration of one physical window.
pub struct WindowAggregate {
    pub id: WindowId,
    pub config: WindowConfig,
    pub thresholds: Thresholds,
    pub calibration: Calibration,

    pub automation: Switch,
    pub scheduled_cover: Cover,
    pub scheduled_value: Sensor,
    pub manual_cover: Cover,
    pub manual_value: Sensor,
    pub window_open_sensor: Option<BinarySensor>,
    pub window_tilted_sensor: Option<BinarySensor>,
    /// Window opening code: 0 closed, 1 tilted, 2 open
    pub window_open_state: Sensor,
    /// Safety clamp
    pub window_open_value: Sensor,
    /// Rain clamp
    pub rain_value: Sensor,
    /// Authoritative target
    pub output_value: Sensor,
    pub output_cover: Cover,
}

impl WindowAggregate {
    pub fn new(ctx: &NodeContext, id: WindowId, config: WindowConfig) -> Self {
        let wid = config.id.clone();
        let device = DeviceInfo {
            identifiers: format!("{}_{}", ctx.node_id, wid),
            manufacturer: MANUFACTURER.to_string(),
            model: WINDOW_MODEL.to_string(),
            name: format!("window_{wid}"),
        };
        let name = |role: &str| format!("{wid}_{role}");
        let sensor = |role: &str| Sensor::new(ctx, &name(role), &device, id);

        let contact = |role: &str, state_topic: Option<&str>| {
            state_topic.map(|t| BinarySensor::new(ctx, &name(role), &device, t, id))
        };

        Self {
            automation: Switch::new(ctx, &name("window_automation"), &device, id),
            scheduled_cover: Cover::controllable(ctx, &name("scheduled_cover"), &device, id),
            scheduled_value: sensor("scheduled_value"),
            manual_cover: Cover::mirror(ctx, &name("manual_cover"), &device, &config.cover_output, id),
            manual_value: sensor("manual_value"),
            window_open_sensor: contact("window_open", config.open_sensor_topic()),
            window_tilted_sensor: contact("window_tilted", config.tilted_sensor_topic()),
            window_open_state: sensor("window_open_state"),
            window_open_value: sensor("window_open_value"),
            rain_value: sensor("rain_value"),
            output_value: sensor("automation_output"),
            output_cover: Cover::actuator(ctx, &name("output_cover"), &device, &config.cover_output, id),
            thresholds: Thresholds::from(&config),
            calibration: Calibration::from(&config),
            config,
            id,
        }
    }

    pub fn entities(&self) -> Vec<&dyn Entity> {
        let mut entities: Vec<&dyn Entity> = vec![
            &self.automation,
            &self.scheduled_cover,
            &self.scheduled_value,
            &self.manual_cover,
            &self.manual_value,
        ];
        if let Some(sensor) = &self.window_open_sensor {
            entities.push(sensor);
        }
        if let Some(sensor) = &self.window_tilted_sensor {
            entities.push(sensor);
        }
        entities.extend([
            &self.window_open_state as &dyn Entity,
            &self.window_open_value,
            &self.rain_value,
            &self.output_value,
            &self.output_cover,
        ]);

        entities
    }

    pub fn initialize(&mut self, store: &StateStore) {
        self.automation.initialize(store);
        self.scheduled_cover.initialize(store);
        self.scheduled_value.initialize(store);
        self.manual_cover.initialize(store);
        self.manual_value.initialize(store);
        if let Some(sensor) = &mut self.window_open_sensor {
            sensor.initialize(store);
        }
        if let Some(sensor) = &mut self.window_tilted_sensor {
            sensor.initialize(store);
        }
        self.window_open_state.initialize(store);
        self.window_open_value.initialize(store);
        self.rain_value.initialize(store);
        self.output_value.initialize(store);
        self.output_cover.initialize(store);
    }

    pub fn name(&self) -> &str {
        &self.config.id
    }

    /// Unconfigured sensors count as a shut contact.
    pub fn opening(&self) -> WindowOpening {
        let open_shut = self.window_open_sensor.as_ref().is_none_or(BinarySensor::is_shut);
        let tilted_shut = self.window_tilted_sensor.as_ref().is_none_or(BinarySensor::is_shut);

        WindowOpening::from_contacts(open_shut, tilted_shut)
    }

    pub fn inputs(&self, rain: RainLevel) -> Inputs {
        Inputs {
            schedule: parse_position(self.scheduled_value.current_value()),
            opening: self.opening(),
            rain,
            manual: Override::parse(self.manual_value.current_value()),
            automation: self.automation.is_on(),
        }
    }

    pub fn command_topic(&self) -> String {
        topic::actuator_command_topic(&self.config.cover_output)
    }

    pub fn calibration_topic(&self) -> String {
        topic::actuator_calibration_topic(&self.config.cover_output)
    }
}
