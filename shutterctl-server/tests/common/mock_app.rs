use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shutterctl_server::configs::{Node, StateStore, Timing, WindowConfig};
use shutterctl_server::entities::NodeContext;
use shutterctl_server::errors::TransportError;
use shutterctl_server::models::Registry;
use shutterctl_server::services::SyncService;
use shutterctl_server::services::transport::{Inbound, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

/// Transport that records instead of sending.
#[derive(Default)]
pub struct RecordingTransport {
    published: Mutex<Vec<Published>>,
    subscribed: Mutex<Vec<String>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<(), TransportError> {
        self.published.lock().unwrap().push(Published {
            topic: topic.to_string(),
            payload,
            retain,
        });
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.subscribed.lock().unwrap().push(topic.to_string());
        Ok(())
    }
}

pub struct MockApp {
    pub transport: Arc<RecordingTransport>,
    pub store: StateStore,
    pub sync: SyncService,
}

impl MockApp {
    pub fn new(windows: Vec<WindowConfig>) -> Self {
        Self::with_store(StateStore::in_memory(), windows)
    }

    pub fn with_store(store: StateStore, windows: Vec<WindowConfig>) -> Self {
        let ctx = NodeContext::new(&Node {
            id: "shutters".to_string(),
            channel: "home".to_string(),
            discovery: "homeassistant".to_string(),
        });
        let timing = Timing {
            discovery_delay_ms: 0,
            calibration_settle_ms: 0,
            calibration_offset: 10,
        };

        let transport = Arc::new(RecordingTransport::default());
        let sync = SyncService::new(Registry::new(ctx, &windows), store.clone(), transport.clone(), timing);

        Self { transport, store, sync }
    }

    pub async fn send(&mut self, topic: &str, payload: &str) {
        self.sync.handle(&Inbound::new(topic, payload)).await.unwrap();
    }

    /// Drains everything published so far.
    pub fn take(&self) -> Vec<Published> {
        std::mem::take(&mut *self.transport.published.lock().unwrap())
    }

    pub fn subscribed(&self) -> Vec<String> {
        self.transport.subscribed.lock().unwrap().clone()
    }

    pub fn state(&self, unique_id: &str) -> Option<String> {
        self.store.get(unique_id)
    }
}

pub fn payloads_to<'a>(published: &'a [Published], topic: &str) -> Vec<&'a str> {
    published
        .iter()
        .filter(|p| p.topic == topic)
        .map(|p| p.payload.as_str())
        .collect()
}

pub fn window(id: &str) -> WindowConfig {
    WindowConfig {
        id: id.to_string(),
        window_open_sensor: Some(format!("z2m/{id}_open")),
        window_tilted_sensor: Some(format!("z2m/{id}_tilted")),
        cover_output: format!("z2m/{id}_cover"),
        cover_output_calibration_time_up: 20,
        cover_output_calibration_time_down: 15,
        open_drizzle: 30,
        open_storm: 10,
        tilted_drizzle: 50,
        tilted_storm: 20,
        tilted_closed: 30,
    }
}

pub fn scheduled(id: &str) -> String {
    format!("home/shutters/cover/shutters_{id}_scheduled_cover/command")
}

pub fn manual(id: &str) -> String {
    format!("home/shutters/cover/shutters_{id}_manual_cover/command")
}

pub fn automation(id: &str) -> String {
    format!("home/shutters/switch/shutters_{id}_window_automation/command")
}

pub fn actuator(id: &str) -> String {
    format!("z2m/{id}_cover")
}

pub fn actuator_set(id: &str) -> String {
    format!("z2m/{id}_cover/set")
}

pub const RAIN: &str = "home/shutters/select/shutters_rain_input/command";
pub const AVAILABILITY: &str = "home/shutters/availability";
pub const OPEN: &str = r#"{"contact":false}"#;
pub const SHUT: &str = r#"{"contact":true}"#;
