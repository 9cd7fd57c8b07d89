use shutterctl_api::discovery::{Component, DeviceInfo, Discovery};
use shutterctl_api::models::ContactState;

use super::{Entity, EntityBase, NodeContext};
use crate::models::WindowId;

const DEVICE_CLASS: &str = "window";
const CONTACT_TEMPLATE: &str = "{{ 'OFF' if value_json.contact else 'ON' }}";

/// Contact sensor reporting on a topic owned by the sensor device.
pub struct BinarySensor {
    base: EntityBase,
}

impl BinarySensor {
    pub fn new(ctx: &NodeContext, name: &str, device: &DeviceInfo, state_topic: &str, window: WindowId) -> Self {
        Self {
            base: EntityBase::new(ctx, Component::BinarySensor, name, device)
                .with_external_state(state_topic)
                .in_window(Some(window)),
        }
    }

    /// Whether the contact is closed; silence and garbage count as closed.
    pub fn is_shut(&self) -> bool {
        ContactState::is_shut(Some(self.base.state.as_str()).filter(|s| !s.is_empty()))
    }
}

impl Entity for BinarySensor {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn default_state(&self) -> String {
        String::new()
    }

    fn discovery(&self, ctx: &NodeContext) -> Discovery {
        Discovery {
            device_class: Some(DEVICE_CLASS.to_string()),
            value_template: Some(CONTACT_TEMPLATE.to_string()),
            ..self.base.discovery(ctx)
        }
    }
}
