mod common;
use common::mock_app::*;

use std::collections::BTreeMap;

use shutterctl_server::configs::{StateStore, TIME_KEY};

async fn started(windows: Vec<shutterctl_server::configs::WindowConfig>) -> MockApp {
    let app = MockApp::new(windows);
    app.sync.start().await.unwrap();
    app.take();
    app
}

#[tokio::test]
async fn test_startup_announces_then_publishes_state() {
    let app = MockApp::new(vec![window("kitchen")]);
    app.sync.start().await.unwrap();

    let published = app.take();
    let discovery: Vec<_> = published
        .iter()
        .filter(|p| p.topic.starts_with("homeassistant/"))
        .collect();
    let states: Vec<_> = published.iter().filter(|p| p.topic.ends_with("/state")).collect();

    assert_eq!(discovery.len(), 13);
    assert!(discovery.iter().all(|p| p.retain));
    assert_eq!(states.len(), 9);
    assert!(states.iter().all(|p| !p.retain));

    let last_discovery = published.iter().rposition(|p| p.topic.starts_with("homeassistant/")).unwrap();
    let first_state = published.iter().position(|p| p.topic.ends_with("/state")).unwrap();
    assert!(last_discovery < first_state);

    let availability = published.last().unwrap();
    assert_eq!(availability.topic, AVAILABILITY);
    assert_eq!(availability.payload, "online");
    assert!(availability.retain);

    let subscribed = app.subscribed();
    assert_eq!(subscribed.len(), 7);
    for topic in [RAIN.to_string(), scheduled("kitchen"), manual("kitchen"), actuator("kitchen")] {
        assert!(subscribed.contains(&topic), "missing subscription {topic}");
    }
}

#[tokio::test]
async fn test_schedule_drives_actuator() {
    let mut app = started(vec![window("kitchen")]).await;

    app.send(&scheduled("kitchen"), "40").await;

    let published = app.take();
    assert_eq!(payloads_to(&published, &actuator_set("kitchen")), vec![r#"{"position":40}"#]);
    assert_eq!(
        payloads_to(&published, "home/shutters/sensor/shutters_kitchen_automation_output/state"),
        vec!["40"]
    );
    assert_eq!(app.state("shutters_kitchen_scheduled_value").as_deref(), Some("40"));
    assert_eq!(app.state("shutters_kitchen_window_open_value").as_deref(), Some(""));
}

#[tokio::test]
async fn test_lowering_is_calibrated() {
    let mut app = started(vec![window("kitchen")]).await;

    app.send(&actuator("kitchen"), r#"{"position":80}"#).await;
    assert!(app.take().is_empty());

    app.send(&scheduled("kitchen"), "50").await;

    assert_eq!(payloads_to(&app.take(), &actuator_set("kitchen")), vec![r#"{"position":67}"#]);
}

#[tokio::test]
async fn test_open_window_recalibrates_and_opens() {
    let mut app = started(vec![window("kitchen")]).await;

    app.send(&scheduled("kitchen"), "20").await;
    app.send(&actuator("kitchen"), r#"{"position":20}"#).await;
    app.take();

    app.send("z2m/kitchen_open", OPEN).await;

    let published = app.take();
    assert_eq!(
        payloads_to(&published, "z2m/kitchen_cover/set/calibration_time"),
        vec!["30", "20"]
    );
    assert_eq!(payloads_to(&published, &actuator_set("kitchen")), vec![r#"{"state":"OPEN"}"#]);

    let calibration = published.iter().position(|p| p.topic.ends_with("/calibration_time")).unwrap();
    let open = published.iter().position(|p| p.topic == actuator_set("kitchen")).unwrap();
    assert!(calibration < open);

    assert_eq!(app.state("shutters_kitchen_window_open_state").as_deref(), Some("2"));
    assert_eq!(app.state("shutters_kitchen_window_open_value").as_deref(), Some("100"));
}

#[tokio::test]
async fn test_rain_fans_out_to_every_window() {
    let symmetric = |id: &str| {
        let mut config = window(id);
        config.cover_output_calibration_time_down = config.cover_output_calibration_time_up;
        config
    };
    let mut app = started(vec![symmetric("kitchen"), symmetric("bedroom")]).await;

    for id in ["kitchen", "bedroom"] {
        app.send(&scheduled(id), "30").await;
        app.send(&actuator(id), r#"{"position":30}"#).await;
        app.send(&format!("z2m/{id}_tilted"), OPEN).await;
    }
    let published = app.take();
    assert!(payloads_to(&published, &actuator_set("kitchen")).iter().all(|p| *p == r#"{"position":30}"#));

    app.send(RAIN, "storm").await;

    let published = app.take();
    for id in ["kitchen", "bedroom"] {
        assert_eq!(payloads_to(&published, &actuator_set(id)), vec![r#"{"position":20}"#]);
        assert_eq!(app.state(&format!("shutters_{id}_rain_value")).as_deref(), Some("20"));
        assert_eq!(app.state(&format!("shutters_{id}_window_open_state")).as_deref(), Some("1"));
    }
    assert_eq!(
        payloads_to(&published, "home/shutters/select/shutters_rain_input/state"),
        vec!["storm"]
    );
}

#[tokio::test]
async fn test_storm_overrides_open_window() {
    let mut app = started(vec![window("kitchen")]).await;

    app.send(RAIN, "storm").await;
    app.send(&scheduled("kitchen"), "30").await;
    app.send(&actuator("kitchen"), r#"{"position":30}"#).await;
    app.take();

    app.send("z2m/kitchen_open", OPEN).await;

    let published = app.take();
    assert!(payloads_to(&published, "z2m/kitchen_cover/set/calibration_time").is_empty());
    assert_eq!(app.state("shutters_kitchen_window_open_value").as_deref(), Some("100"));
    assert_eq!(app.state("shutters_kitchen_rain_value").as_deref(), Some("10"));
    assert_eq!(app.state("shutters_kitchen_automation_output").as_deref(), Some("10"));
}

#[tokio::test]
async fn test_unknown_rain_level_is_ignored() {
    let mut app = started(vec![window("kitchen")]).await;

    app.send(RAIN, "drizzle").await;
    app.take();

    app.send(RAIN, "hail").await;

    let published = app.take();
    assert_eq!(
        published,
        vec![Published {
            topic: "home/shutters/select/shutters_rain_input/state".to_string(),
            payload: "drizzle".to_string(),
            retain: false,
        }]
    );
    assert_eq!(app.state("shutters_rain_input").as_deref(), Some("drizzle"));
}

#[tokio::test]
async fn test_manual_stop_is_unconditional() {
    let mut app = started(vec![window("kitchen")]).await;

    app.send(&scheduled("kitchen"), "40").await;
    app.send(&actuator("kitchen"), r#"{"position":40}"#).await;
    app.take();

    app.send(&manual("kitchen"), "STOP").await;

    let published = app.take();
    assert_eq!(payloads_to(&published, &actuator_set("kitchen")), vec![r#"{"state":"STOP"}"#]);
    assert_eq!(app.state("shutters_kitchen_manual_value").as_deref(), Some("STOP"));
}

#[tokio::test]
async fn test_manual_open_stops_short_of_recalibration() {
    let mut app = started(vec![window("kitchen")]).await;

    app.send(&actuator("kitchen"), r#"{"position":50}"#).await;
    app.send(&manual("kitchen"), "OPEN").await;

    let published = app.take();
    assert_eq!(payloads_to(&published, &actuator_set("kitchen")), vec![r#"{"position":99}"#]);
    assert!(payloads_to(&published, "z2m/kitchen_cover/set/calibration_time").is_empty());
    assert_eq!(app.state("shutters_kitchen_manual_value").as_deref(), Some("99"));
}

#[tokio::test]
async fn test_reported_position_suppresses_command() {
    let mut app = started(vec![window("kitchen")]).await;

    app.send(&actuator("kitchen"), r#"{"position":40}"#).await;
    app.send(&scheduled("kitchen"), "40").await;

    assert!(payloads_to(&app.take(), &actuator_set("kitchen")).is_empty());
}

#[tokio::test]
async fn test_schedule_clears_manual_override() {
    let mut app = started(vec![window("kitchen")]).await;

    app.send(&manual("kitchen"), "30").await;
    app.send(&actuator("kitchen"), r#"{"position":30}"#).await;
    app.take();

    app.send(&scheduled("kitchen"), "60").await;

    let published = app.take();
    assert_eq!(app.state("shutters_kitchen_manual_value").as_deref(), Some(""));
    assert_eq!(payloads_to(&published, &actuator_set("kitchen")), vec![r#"{"position":60}"#]);
}

#[tokio::test]
async fn test_automation_off_follows_manual_only() {
    let mut app = started(vec![window("kitchen")]).await;

    app.send(&automation("kitchen"), "OFF").await;
    app.send(&scheduled("kitchen"), "60").await;

    let published = app.take();
    assert!(payloads_to(&published, &actuator_set("kitchen")).is_empty());
    assert_eq!(
        payloads_to(&published, "home/shutters/switch/shutters_kitchen_window_automation/state"),
        vec!["OFF"]
    );

    app.send(&manual("kitchen"), "25").await;

    assert_eq!(payloads_to(&app.take(), &actuator_set("kitchen")), vec![r#"{"position":25}"#]);
}

#[tokio::test]
async fn test_actuator_reports_merge_without_commands() {
    let mut app = started(vec![window("kitchen")]).await;

    app.send(&actuator("kitchen"), r#"{"calibration_time":20}"#).await;
    app.send(&actuator("kitchen"), r#"{"position":35,"state":"STOP"}"#).await;

    assert!(app.take().is_empty());

    let expected = r#"{"calibration_time":20,"position":35,"state":"STOP"}"#;
    assert_eq!(app.state("shutters_kitchen_output_cover").as_deref(), Some(expected));
    assert_eq!(app.state("shutters_kitchen_manual_cover").as_deref(), Some(expected));
}

#[tokio::test]
async fn test_restored_state_is_republished() {
    let store = StateStore::in_memory();
    store.set("shutters_kitchen_manual_value", "STOP");
    store.set("shutters_rain_input", "drizzle");

    let app = MockApp::with_store(store, vec![window("kitchen")]);
    app.sync.start().await.unwrap();

    let published = app.take();
    assert_eq!(
        payloads_to(&published, "home/shutters/sensor/shutters_kitchen_manual_value/state"),
        vec!["STOP"]
    );
    assert_eq!(
        payloads_to(&published, "home/shutters/select/shutters_rain_input/state"),
        vec!["drizzle"]
    );
}

#[tokio::test]
async fn test_shutdown_marks_node_offline() {
    let app = started(vec![window("kitchen")]).await;

    app.sync.shutdown().await.unwrap();

    let published = app.take();
    let last = published.last().unwrap();
    assert_eq!(last.topic, AVAILABILITY);
    assert_eq!(last.payload, "offline");
    assert!(last.retain);
}

#[tokio::test]
async fn test_shutdown_flushes_states() {
    let path = std::env::temp_dir().join(format!("shutterctl-shutdown-{}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let mut app = MockApp::with_store(StateStore::load(&path), vec![window("kitchen")]);
    app.sync.start().await.unwrap();
    app.send(RAIN, "storm").await;

    assert!(!path.exists());

    app.sync.shutdown().await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let snapshot: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(snapshot.get("shutters_rain_input").map(String::as_str), Some("storm"));
    assert_eq!(snapshot.get("shutters_kitchen_rain_value").map(String::as_str), Some(""));
    assert!(snapshot.contains_key(TIME_KEY));

    let _ = std::fs::remove_file(path);
}
