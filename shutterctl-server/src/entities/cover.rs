use shutterctl_api::discovery::{Component, DeviceInfo, Discovery};
use shutterctl_api::models::CoverState;
use shutterctl_api::topic;

use super::{Entity, EntityBase, NodeContext};
use crate::configs::StateStore;
use crate::models::WindowId;

const POSITION_TEMPLATE: &str = "{{ value_json.position }}";
const SET_POSITION_TEMPLATE: &str = "{ \"position\": {{ position }} }";
const STATE_TEMPLATE: &str = "{{ value_json.state }}";

/// Positionable cover whose state is a [`CoverState`] record.
///
/// Incoming payloads are merged field by field into the record, and the
/// entity's textual state is always the encoded record so that change
/// detection compares merged forms.
pub struct Cover {
    base: EntityBase,
    record: CoverState,
}

impl Cover {
    fn with_base(base: EntityBase) -> Self {
        let record = CoverState::initial();
        let mut cover = Self { base, record };
        cover.sync_state();
        cover
    }

    /// Cover driven through its own command and state topics.
    pub fn controllable(ctx: &NodeContext, name: &str, device: &DeviceInfo, window: WindowId) -> Self {
        Self::with_base(
            EntityBase::new(ctx, Component::Cover, name, device)
                .with_command_topic(ctx)
                .in_window(Some(window)),
        )
    }

    /// Cover with its own command topic whose state mirrors an actuator.
    pub fn mirror(ctx: &NodeContext, name: &str, device: &DeviceInfo, actuator: &str, window: WindowId) -> Self {
        Self::with_base(
            EntityBase::new(ctx, Component::Cover, name, device)
                .with_command_topic(ctx)
                .with_external_state(actuator)
                .in_window(Some(window)),
        )
    }

    /// The physical actuator, reporting on `actuator` and commanded on `{actuator}/set`.
    pub fn actuator(ctx: &NodeContext, name: &str, device: &DeviceInfo, actuator: &str, window: WindowId) -> Self {
        let mut base = EntityBase::new(ctx, Component::Cover, name, device)
            .with_external_state(actuator)
            .in_window(Some(window));
        base.command_topic = Some(topic::actuator_command_topic(actuator));

        Self::with_base(base)
    }

    pub fn record(&self) -> &CoverState {
        &self.record
    }

    /// Last reported position, fully closed if never reported.
    pub fn position(&self) -> u8 {
        self.record.position_or_closed()
    }

    /// Merges `update` into the record and writes the result through.
    pub fn merge(&mut self, update: CoverState, store: &StateStore) -> bool {
        let before = self.base.state.clone();
        self.record.merge(update);
        self.sync_state();
        store.set(&self.base.unique_id, &self.base.state);

        let changed = before != self.base.state;
        if changed {
            tracing::debug!("Set cover state {}={}", self.base.unique_id, self.base.state);
        }
        changed
    }

    fn sync_state(&mut self) {
        match self.record.encode() {
            Ok(encoded) => self.base.state = encoded,
            Err(e) => tracing::warn!("Failed to encode cover state of {}: {}", self.base.unique_id, e),
        }
    }
}

impl Entity for Cover {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn default_state(&self) -> String {
        CoverState::initial().encode().unwrap_or_default()
    }

    fn restore(&mut self, value: String) {
        self.record = CoverState::decode(&value);
        self.sync_state();
    }

    fn apply_update(&mut self, value: &str, store: &StateStore) -> bool {
        let mut update = CoverState::default();

        if let Err(e) = update.merge_payload(value) {
            tracing::warn!("Ignoring malformed cover payload for {}: {}", self.base.unique_id, e);
            return false;
        }

        self.merge(update, store)
    }

    fn discovery(&self, ctx: &NodeContext) -> Discovery {
        let base = self.base.discovery(ctx);

        Discovery {
            json_attributes_topic: base.state_topic.clone(),
            position_topic: base.state_topic.clone(),
            set_position_topic: base.command_topic.clone(),
            position_template: Some(POSITION_TEMPLATE.to_string()),
            set_position_template: Some(SET_POSITION_TEMPLATE.to_string()),
            value_template: Some(STATE_TEMPLATE.to_string()),
            ..base
        }
    }
}
