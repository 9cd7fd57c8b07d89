use shutterctl_api::discovery::{Component, DeviceInfo};

use super::{Entity, EntityBase, NodeContext};
use crate::configs::StateStore;
use crate::models::WindowId;

pub const ON: &str = "ON";
pub const OFF: &str = "OFF";

/// Two-state toggle accepting `ON` and `OFF`.
pub struct Switch {
    base: EntityBase,
}

impl Switch {
    pub fn new(ctx: &NodeContext, name: &str, device: &DeviceInfo, window: WindowId) -> Self {
        Self {
            base: EntityBase::new(ctx, Component::Switch, name, device)
                .with_command_topic(ctx)
                .in_window(Some(window)),
        }
    }

    pub fn is_on(&self) -> bool {
        self.base.state != OFF
    }
}

impl Entity for Switch {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn default_state(&self) -> String {
        ON.to_string()
    }

    fn apply_update(&mut self, value: &str, store: &StateStore) -> bool {
        let value = value.trim();

        if value != ON && value != OFF {
            tracing::warn!("Ignoring {} for {}, expected {} or {}", value, self.base.unique_id, ON, OFF);
            return false;
        }

        self.base.store_value(value, store)
    }
}
