mod binary_sensor;
mod cover;
mod select;
mod sensor;
mod switch;

pub use binary_sensor::*;
pub use cover::*;
pub use select::*;
pub use sensor::*;
pub use switch::*;

use shutterctl_api::discovery::{Component, DeviceInfo, Discovery};
use shutterctl_api::topic;

use crate::configs::{Node, StateStore};
use crate::models::WindowId;

/// Node-wide naming used to derive entity ids and topics.
#[derive(Debug, Clone)]
pub struct NodeContext {
    pub node_id: String,
    pub channel: String,
    pub discovery: String,
    pub availability_topic: String,
}

impl NodeContext {
    pub fn new(node: &Node) -> Self {
        Self {
            node_id: node.id.clone(),
            channel: node.channel.clone(),
            discovery: node.discovery.clone(),
            availability_topic: topic::availability_topic(&node.channel, &node.id),
        }
    }

    pub fn unique_id(&self, name: &str) -> String {
        topic::unique_id(&self.node_id, name)
    }

    pub fn own_topic(&self, component: Component, unique_id: &str, suffix: &str) -> String {
        topic::entity_topic(&self.channel, &self.node_id, component.as_str(), unique_id, suffix)
    }

    pub fn discovery_topic(&self, component: Component, unique_id: &str) -> String {
        topic::discovery_topic(&self.discovery, component.as_str(), &self.node_id, unique_id)
    }
}

/// Identity, topics and current value shared by every entity role.
#[derive(Debug, Clone)]
pub struct EntityBase {
    pub name: String,
    pub unique_id: String,
    pub component: Component,
    pub device: DeviceInfo,
    pub state: String,
    pub state_topic: Option<String>,
    pub command_topic: Option<String>,
    /// Whether `state_topic` belongs to this node rather than to a device
    pub owns_state_topic: bool,
    /// Owning window, `None` for node-wide entities
    pub window: Option<WindowId>,
}

impl EntityBase {
    pub fn new(ctx: &NodeContext, component: Component, name: &str, device: &DeviceInfo) -> Self {
        let unique_id = ctx.unique_id(name);

        Self {
            name: name.to_string(),
            state_topic: Some(ctx.own_topic(component, &unique_id, "state")),
            command_topic: None,
            owns_state_topic: true,
            unique_id,
            component,
            device: device.clone(),
            state: String::new(),
            window: None,
        }
    }

    pub fn with_command_topic(mut self, ctx: &NodeContext) -> Self {
        self.command_topic = Some(ctx.own_topic(self.component, &self.unique_id, "command"));
        self
    }

    pub fn with_external_state(mut self, state_topic: &str) -> Self {
        self.state_topic = Some(state_topic.to_string());
        self.owns_state_topic = false;
        self
    }

    pub fn in_window(mut self, window: Option<WindowId>) -> Self {
        self.window = window;
        self
    }

    /// Replaces the value and writes it through to the store.
    pub fn store_value(&mut self, value: &str, store: &StateStore) -> bool {
        let changed = self.state != value;

        if changed {
            tracing::debug!("Set {} state {}={}", self.component.as_str(), self.unique_id, value);
            self.state = value.to_string();
        }
        store.set(&self.unique_id, &self.state);

        changed
    }

    /// Discovery fields common to every role.
    pub fn discovery(&self, ctx: &NodeContext) -> Discovery {
        Discovery {
            name: self.name.clone(),
            unique_id: self.unique_id.clone(),
            device: Some(self.device.clone()),
            availability_topic: Some(ctx.availability_topic.clone()),
            state_topic: self.state_topic.clone(),
            command_topic: self.command_topic.clone(),
            qos: 1,
            ..Default::default()
        }
    }
}

/// Lifecycle shared by every addressable piece of state.
pub trait Entity: Send + Sync {
    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    /// Value used when nothing was persisted for this entity.
    fn default_state(&self) -> String;

    /// Assigns the persisted value if there is one, the default otherwise.
    fn initialize(&mut self, store: &StateStore) {
        let value = store
            .get(&self.base().unique_id)
            .unwrap_or_else(|| self.default_state());
        self.restore(value);

        let base = self.base();
        store.set(&base.unique_id, &base.state);
    }

    /// Installs a value without writing it back to the store.
    fn restore(&mut self, value: String) {
        self.base_mut().state = value;
    }

    fn unique_id(&self) -> &str {
        &self.base().unique_id
    }

    fn current_value(&self) -> &str {
        &self.base().state
    }

    fn window(&self) -> Option<WindowId> {
        self.base().window
    }

    /// Replaces the current value and writes it through to the store.
    ///
    /// Returns whether the value changed.
    fn apply_update(&mut self, value: &str, store: &StateStore) -> bool {
        self.base_mut().store_value(value, store)
    }

    /// Handles a payload received on the entity's state topic.
    fn on_external_message(&mut self, payload: &str, store: &StateStore) -> bool {
        self.apply_update(payload, store)
    }

    fn discovery(&self, ctx: &NodeContext) -> Discovery {
        self.base().discovery(ctx)
    }

    fn discovery_topic(&self, ctx: &NodeContext) -> String {
        let base = self.base();
        ctx.discovery_topic(base.component, &base.unique_id)
    }

    /// Topic and payload to republish, for entities owning their state topic.
    fn state_message(&self) -> Option<(&str, &str)> {
        let base = self.base();
        match (&base.state_topic, base.owns_state_topic) {
            (Some(topic), true) => Some((topic.as_str(), base.state.as_str())),
            _ => None,
        }
    }
}
