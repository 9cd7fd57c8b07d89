use std::collections::BTreeMap;

use shutterctl_api::discovery::{DeviceInfo, MANUFACTURER, NODE_MODEL};
use shutterctl_api::models::RainLevel;

use super::{WindowAggregate, WindowId};
use crate::configs::{StateStore, WindowConfig};
use crate::entities::{Entity, NodeContext, Select};
use crate::errors::ControlError;

const RAIN_INPUT: &str = "rain_input";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    Open,
    Tilted,
}

/// What an inbound topic feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    RainCommand,
    AutomationCommand(WindowId),
    ScheduledCommand(WindowId),
    ManualCommand(WindowId),
    ContactState(WindowId, Contact),
    ActuatorState(WindowId),
}

/// Owner of every entity of the node.
///
/// Entities refer to their window by [`WindowId`]; lookups go through here.
pub struct Registry {
    pub ctx: NodeContext,
    pub rain_input: Select,
    pub windows: Vec<WindowAggregate>,
    routes: BTreeMap<String, Vec<Route>>,
}

impl Registry {
    pub fn new(ctx: NodeContext, windows: &[WindowConfig]) -> Self {
        let device = DeviceInfo {
            identifiers: ctx.node_id.clone(),
            manufacturer: MANUFACTURER.to_string(),
            model: NODE_MODEL.to_string(),
            name: ctx.node_id.clone(),
        };
        let options = RainLevel::OPTIONS.map(|level| level.as_str());
        let rain_input = Select::new(&ctx, RAIN_INPUT, &device, &options);

        let windows: Vec<WindowAggregate> = windows
            .iter()
            .enumerate()
            .map(|(id, config)| WindowAggregate::new(&ctx, id, config.clone()))
            .collect();

        let mut registry = Self {
            ctx,
            rain_input,
            windows,
            routes: BTreeMap::new(),
        };
        registry.build_routes();

        registry
    }

    /// Keys every command and state topic to its handler. Per-window routes
    /// carry the window handle of the entity listening on the topic.
    fn build_routes(&mut self) {
        let mut routes: BTreeMap<String, Vec<Route>> = BTreeMap::new();

        if let Some(topic) = &self.rain_input.base().command_topic {
            routes.entry(topic.clone()).or_default().push(Route::RainCommand);
        }

        let mut listen = |entity: &dyn Entity, topic: Option<&String>, route: fn(WindowId) -> Route| {
            if let (Some(topic), Some(id)) = (topic, entity.window()) {
                routes.entry(topic.clone()).or_default().push(route(id));
            }
        };

        for window in &self.windows {
            listen(&window.automation, window.automation.base().command_topic.as_ref(), Route::AutomationCommand);
            listen(&window.scheduled_cover, window.scheduled_cover.base().command_topic.as_ref(), Route::ScheduledCommand);
            listen(&window.manual_cover, window.manual_cover.base().command_topic.as_ref(), Route::ManualCommand);
            if let Some(sensor) = &window.window_open_sensor {
                listen(sensor, sensor.base().state_topic.as_ref(), |id| Route::ContactState(id, Contact::Open));
            }
            if let Some(sensor) = &window.window_tilted_sensor {
                listen(sensor, sensor.base().state_topic.as_ref(), |id| Route::ContactState(id, Contact::Tilted));
            }
            listen(&window.output_cover, window.output_cover.base().state_topic.as_ref(), Route::ActuatorState);
        }

        self.routes = routes;
    }

    /// Restores every entity from the store or assigns its default.
    pub fn initialize(&mut self, store: &StateStore) {
        self.rain_input.initialize(store);
        for window in &mut self.windows {
            window.initialize(store);
        }
    }

    /// Topics to subscribe, each once.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn routes(&self, topic: &str) -> &[Route] {
        self.routes.get(topic).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn entities(&self) -> Vec<&dyn Entity> {
        let mut entities: Vec<&dyn Entity> = vec![&self.rain_input];
        for window in &self.windows {
            entities.extend(window.entities());
        }
        entities
    }

    pub fn rain_level(&self) -> RainLevel {
        RainLevel::parse_lossy(self.rain_input.current_value())
    }

    pub fn window(&self, id: WindowId) -> Result<&WindowAggregate, ControlError> {
        self.windows.get(id).ok_or(ControlError::UnknownWindow(id))
    }

    pub fn window_mut(&mut self, id: WindowId) -> Result<&mut WindowAggregate, ControlError> {
        self.windows.get_mut(id).ok_or(ControlError::UnknownWindow(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::tests::context;
    use crate::models::window::tests::config;

    fn registry() -> Registry {
        let mut bathroom = config();
        bathroom.id = "bathroom".to_string();
        bathroom.window_open_sensor = None;
        bathroom.window_tilted_sensor = Some("z2m/bathroom_tilted".to_string());
        bathroom.cover_output = "z2m/bathroom_cover".to_string();

        Registry::new(context(), &[config(), bathroom])
    }

    #[test]
    fn test_routes() {
        let registry = registry();

        assert_eq!(
            registry.routes("home/shutters/select/shutters_rain_input/command"),
            &[Route::RainCommand]
        );
        assert_eq!(
            registry.routes("home/shutters/cover/shutters_bathroom_manual_cover/command"),
            &[Route::ManualCommand(1)]
        );
        assert_eq!(
            registry.routes("z2m/bathroom_tilted"),
            &[Route::ContactState(1, Contact::Tilted)]
        );
        assert_eq!(registry.routes("z2m/kitchen_cover"), &[Route::ActuatorState(0)]);
        assert!(registry.routes("z2m/unknown").is_empty());
    }

    #[test]
    fn test_routes_follow_entity_window() {
        let mut bathroom = config();
        bathroom.id = "bathroom".to_string();
        bathroom.cover_output = "z2m/bathroom_cover".to_string();
        let mut registry = Registry::new(context(), &[bathroom]);

        registry.windows[0].manual_cover.base_mut().window = Some(5);
        registry.windows[0].automation.base_mut().window = None;
        registry.build_routes();

        assert_eq!(
            registry.routes("home/shutters/cover/shutters_bathroom_manual_cover/command"),
            &[Route::ManualCommand(5)]
        );
        assert!(
            registry
                .routes("home/shutters/switch/shutters_bathroom_window_automation/command")
                .is_empty()
        );
    }

    #[test]
    fn test_topics_are_unique() {
        let registry = registry();
        let topics: Vec<&str> = registry.topics().collect();

        // rain + 2 * (automation, scheduled, manual, contact, actuator)
        assert_eq!(topics.len(), 11);
    }

    #[test]
    fn test_entities_cover_every_window() {
        let mut registry = registry();
        registry.initialize(&StateStore::in_memory());

        assert_eq!(registry.entities().len(), 1 + 11 + 11);
        assert_eq!(registry.rain_level(), RainLevel::None);
        assert!(matches!(registry.window(2), Err(ControlError::UnknownWindow(2))));
    }
}
