use shutterctl_api::discovery::{Component, DeviceInfo, Discovery};

use super::{Entity, EntityBase, NodeContext};
use crate::configs::StateStore;

/// Enumerated input restricted to a fixed set of options.
pub struct Select {
    base: EntityBase,
    options: Vec<String>,
    default: String,
}

impl Select {
    pub fn new(ctx: &NodeContext, name: &str, device: &DeviceInfo, options: &[&str]) -> Self {
        let options: Vec<String> = options.iter().map(|o| o.to_string()).collect();

        Self {
            base: EntityBase::new(ctx, Component::Select, name, device).with_command_topic(ctx),
            default: options.first().cloned().unwrap_or_default(),
            options,
        }
    }

    fn accepts(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }
}

impl Entity for Select {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn default_state(&self) -> String {
        self.default.clone()
    }

    fn restore(&mut self, value: String) {
        self.base.state = if self.accepts(&value) { value } else { self.default_state() };
    }

    fn apply_update(&mut self, value: &str, store: &StateStore) -> bool {
        let value = value.trim();

        if !self.accepts(value) {
            tracing::warn!("Ignoring {} for {}, expected one of {:?}", value, self.base.unique_id, self.options);
            return false;
        }

        self.base.store_value(value, store)
    }

    fn discovery(&self, ctx: &NodeContext) -> Discovery {
        Discovery {
            options: self.options.clone(),
            ..self.base.discovery(ctx)
        }
    }
}
