use shutterctl_api::discovery::{Component, DeviceInfo};

use super::{Entity, EntityBase, NodeContext};
use crate::models::WindowId;

/// Read-only value computed by the controller.
pub struct Sensor {
    base: EntityBase,
}

impl Sensor {
    pub fn new(ctx: &NodeContext, name: &str, device: &DeviceInfo, window: WindowId) -> Self {
        Self {
            base: EntityBase::new(ctx, Component::Sensor, name, device).in_window(Some(window)),
        }
    }
}

impl Entity for Sensor {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn default_state(&self) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::StateStore;
    use crate::entities::tests::{context, device};

    #[test]
    fn test_sensor_write_through() {
        let store = StateStore::in_memory();
        let mut sensor = Sensor::new(&context(), "kitchen_rain_value", &device(), 0);
        sensor.initialize(&store);
        assert_eq!(sensor.current_value(), "");

        assert!(sensor.apply_update("10", &store));
        assert!(!sensor.apply_update("10", &store));
        assert_eq!(store.get("shutters_kitchen_rain_value").as_deref(), Some("10"));
        assert_eq!(
            sensor.state_message(),
            Some(("home/shutters/sensor/shutters_kitchen_rain_value/state", "10"))
        );
    }
}
