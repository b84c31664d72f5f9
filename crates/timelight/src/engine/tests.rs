use std::time::Duration;

use chrono::NaiveDate;
use chrono::NaiveDateTime;
use serde_json::json;
use tokio::sync::mpsc;

use super::bridge::MockBridge;
use super::*;
use crate::integrations::hue;

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 15)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn schedule() -> Schedule {
    Schedule::Uniform(TransitionSpec::Linear(LinearTransition {
        start_minute: 6 * 60,
        end_minute: 23 * 60 + 59,
        start: TargetState::default()
            .with_brightness(100.0)
            .with_color_temp(250),
        end: TargetState::default()
            .with_brightness(30.0)
            .with_color_temp(454),
    }))
}

fn bridge() -> MockBridge {
    let lights = serde_json::from_value(json!([
        {
            "id": "ambiance",
            "metadata": {"name": "Sofa"},
            "on": {"on": true},
            "dimming": {"brightness": 80.0},
            "color_temperature": {"mirek": 300, "mirek_valid": true}
        },
        {
            "id": "dimmer",
            "metadata": {"name": "Hall"},
            "on": {"on": true},
            "dimming": {"brightness": 80.0}
        },
        {
            "id": "lamp",
            "metadata": {"name": "Desk"},
            "on": {"on": true},
            "dimming": {"brightness": 80.0}
        }
    ]))
    .unwrap();
    let scenes = serde_json::from_value(json!([
        {
            "id": "evening",
            "metadata": {"name": "Evening Timelight"},
            "actions": [
                {"target": {"rid": "ambiance", "rtype": "light"}, "action": {"on": {"on": true}}},
                {"target": {"rid": "dimmer", "rtype": "light"}, "action": {"on": {"on": true}}}
            ]
        },
        {
            "id": "relax",
            "metadata": {"name": "Relax"},
            "actions": [
                {"target": {"rid": "lamp", "rtype": "light"}, "action": {"on": {"on": true}}}
            ]
        }
    ]))
    .unwrap();
    MockBridge::new(lights, scenes)
}

async fn engine(bridge: &MockBridge) -> Engine<MockBridge> {
    Engine::initialize(bridge.clone(), schedule(), EngineSettings::default())
        .await
        .unwrap()
}

fn update_event(resource: serde_json::Value) -> hue::Event {
    hue::Event {
        id: "evt".to_string(),
        last_event_id: None,
        creation_time: None,
        event_type: hue::Event::UPDATE.to_string(),
        data: vec![hue::Resource::decode(resource).unwrap()],
    }
}

fn scene_recall(id: &str) -> hue::Event {
    update_event(json!({
        "id": id,
        "type": "scene",
        "status": {"active": "static"}
    }))
}

fn light_report(id: &str, brightness: f64) -> hue::Event {
    update_event(json!({
        "id": id,
        "type": "light",
        "dimming": {"brightness": brightness}
    }))
}

fn light_ids(updates: &[(String, hue::LightUpdate)]) -> Vec<&str> {
    updates.iter().map(|(id, _)| id.as_str()).collect()
}

#[tokio::test]
async fn test_initialize_leaves_lights_unmanaged() {
    let bridge = bridge();
    let engine = engine(&bridge).await;

    assert_eq!(engine.registry().lights().count(), 3);
    assert_eq!(engine.registry().managed_count(), 0);
    assert_eq!(engine.registry().scenes().count(), 1);
    assert_eq!(bridge.command_count(), 0);
}

#[tokio::test]
async fn test_initialize_fails_when_bridge_unreachable() {
    let bridge = bridge();
    bridge.fail_queries();

    let result = Engine::initialize(bridge, schedule(), EngineSettings::default()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_reconcile_updates_scenes_only_until_recall() {
    let bridge = bridge();
    let mut engine = engine(&bridge).await;

    let report = engine.reconcile(at(21, 0)).await;
    assert_eq!(report.lights, DispatchReport::default());
    assert_eq!(report.scenes.successes, 1);
    assert!(bridge.light_updates().is_empty());

    let scene_updates = bridge.scene_updates();
    assert_eq!(scene_updates.len(), 1);
    assert_eq!(scene_updates[0].0, "evening");

    let target = schedule().target_light_state(at(21, 0).time());
    let actions = scene_updates[0].1.actions.as_ref().unwrap();
    let ambiance = &actions[0].action;
    assert_eq!(ambiance.on, Some(hue::LightOn { on: true }));
    assert_eq!(
        ambiance.dimming,
        Some(hue::DimmingAction {
            brightness: target.brightness.unwrap()
        })
    );
    assert_eq!(
        ambiance.color_temperature,
        Some(hue::ColorTemperatureAction {
            mirek: target.color_temp_mirek.unwrap()
        })
    );
    // dimmable only
    assert_eq!(actions[1].action.color_temperature, None);
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let bridge = bridge();
    let mut engine = engine(&bridge).await;

    engine.handle_event(&scene_recall("evening"), at(21, 0));
    engine.reconcile(at(21, 0)).await;
    assert!(bridge.command_count() > 0);

    bridge.clear();
    let report = engine.reconcile(at(21, 0)).await;
    assert_eq!(bridge.command_count(), 0);
    assert_eq!(report.lights.skipped, 2);
    assert_eq!(report.scenes.skipped, 1);
}

#[tokio::test]
async fn test_scene_recall_adopts_members() {
    let bridge = bridge();
    let mut engine = engine(&bridge).await;
    engine.reconcile(at(21, 0)).await;

    let outcome = engine.handle_event(&scene_recall("evening"), at(21, 0));
    assert_eq!(outcome.adopted, 2);
    assert!(engine.registry().light("ambiance").unwrap().managed);
    assert!(engine.registry().light("dimmer").unwrap().managed);
    assert!(!engine.registry().light("lamp").unwrap().managed);

    // the recall already applied the pushed scene state
    bridge.clear();
    let report = engine.reconcile(at(21, 0)).await;
    assert_eq!(report.lights.skipped, 2);
    assert!(bridge.light_updates().is_empty());

    let report = engine.reconcile(at(21, 30)).await;
    assert_eq!(report.lights.successes, 2);
    assert_eq!(light_ids(&bridge.light_updates()), vec!["ambiance", "dimmer"]);

    let (_, update) = &bridge.light_updates()[1];
    assert_eq!(update.color_temperature, None);
    assert_eq!(update.dynamics, Some(hue::Dynamics { duration: 10_000 }));
}

#[tokio::test]
async fn test_recall_before_first_scene_push() {
    let bridge = bridge();
    let mut engine = engine(&bridge).await;

    engine.handle_event(&scene_recall("evening"), at(21, 0));
    assert_eq!(engine.registry().managed_count(), 2);

    let report = engine.reconcile(at(21, 0)).await;
    assert_eq!(report.lights.successes, 2);
}

#[tokio::test]
async fn test_scene_event_without_status_is_ignored() {
    let bridge = bridge();
    let mut engine = engine(&bridge).await;

    let edit = update_event(json!({
        "id": "evening",
        "type": "scene",
        "metadata": {"name": "Evening Timelight"}
    }));
    assert_eq!(engine.handle_event(&edit, at(21, 0)).adopted, 0);
    assert_eq!(engine.registry().managed_count(), 0);

    // the status may arrive in a later event
    assert_eq!(engine.handle_event(&scene_recall("evening"), at(21, 1)).adopted, 2);
}

#[tokio::test]
async fn test_recall_of_other_scene_is_ignored() {
    let bridge = bridge();
    let mut engine = engine(&bridge).await;

    let outcome = engine.handle_event(&scene_recall("relax"), at(21, 0));
    assert_eq!(outcome, DetectorOutcome::default());
    assert_eq!(engine.registry().managed_count(), 0);
}

#[tokio::test]
async fn test_manual_change_releases_light() {
    let bridge = bridge();
    let mut engine = engine(&bridge).await;
    engine.handle_event(&scene_recall("evening"), at(21, 0));
    engine.reconcile(at(21, 0)).await;

    let target = schedule().target_light_state(at(21, 0).time());
    let commanded = target.brightness.unwrap();

    // bridge echo of our own command
    let outcome = engine.handle_event(&light_report("dimmer", commanded + 1.0), at(21, 0));
    assert_eq!(outcome.released, 0);
    assert!(engine.registry().light("dimmer").unwrap().managed);

    let outcome = engine.handle_event(&light_report("dimmer", commanded + 20.0), at(21, 1));
    assert_eq!(outcome.released, 1);
    assert!(!engine.registry().light("dimmer").unwrap().managed);

    // the ticker never takes a released light back
    bridge.clear();
    engine.reconcile(at(21, 30)).await;
    engine.reconcile(at(22, 0)).await;
    assert_eq!(light_ids(&bridge.light_updates()), vec!["ambiance", "ambiance"]);

    // only a recall does
    engine.handle_event(&scene_recall("evening"), at(22, 5));
    assert!(engine.registry().light("dimmer").unwrap().managed);
}

#[tokio::test]
async fn test_power_off_releases_light() {
    let bridge = bridge();
    let mut engine = engine(&bridge).await;
    engine.handle_event(&scene_recall("evening"), at(21, 0));

    let off = update_event(json!({"id": "ambiance", "type": "light", "on": {"on": false}}));
    assert_eq!(engine.handle_event(&off, at(21, 0)).released, 1);
    assert_eq!(engine.registry().managed_count(), 1);
}

#[tokio::test]
async fn test_unmanaged_light_reports_are_ignored() {
    let bridge = bridge();
    let mut engine = engine(&bridge).await;

    let outcome = engine.handle_event(&light_report("lamp", 3.0), at(21, 0));
    assert_eq!(outcome, DetectorOutcome::default());
    let outcome = engine.handle_event(&light_report("unknown", 3.0), at(21, 0));
    assert_eq!(outcome, DetectorOutcome::default());
}

#[tokio::test]
async fn test_non_update_event_is_ignored() {
    let bridge = bridge();
    let mut engine = engine(&bridge).await;

    let mut event = scene_recall("evening");
    event.event_type = "add".to_string();
    assert_eq!(engine.handle_event(&event, at(21, 0)), DetectorOutcome::default());
    assert_eq!(engine.registry().managed_count(), 0);
}

#[tokio::test]
async fn test_partial_failure_does_not_block_pass() {
    let bridge = bridge();
    let mut engine = engine(&bridge).await;
    engine.handle_event(&scene_recall("evening"), at(21, 0));
    bridge.fail_on("ambiance");

    let report = engine.reconcile(at(21, 0)).await;
    assert_eq!(report.lights.successes, 1);
    assert_eq!(report.lights.errors, 1);
    assert_eq!(report.scenes.successes, 1);
    assert_eq!(light_ids(&bridge.light_updates()), vec!["dimmer"]);

    // failure never changes managed status
    let ambiance = engine.registry().light("ambiance").unwrap();
    assert!(ambiance.managed);
    assert_eq!(ambiance.last_command_time, Some(at(21, 0)));

    // and the failed light is retried next pass
    let report = engine.reconcile(at(21, 0)).await;
    assert_eq!(report.lights.errors, 1);
    assert_eq!(report.lights.skipped, 1);
}

#[tokio::test]
async fn test_failed_scene_update_is_retried() {
    let bridge = bridge();
    let mut engine = engine(&bridge).await;
    bridge.fail_on("evening");

    let report = engine.reconcile(at(21, 0)).await;
    assert_eq!(report.scenes.errors, 1);
    assert!(engine.registry().scene("evening").unwrap().last_commanded.is_none());

    let report = engine.reconcile(at(21, 0)).await;
    assert_eq!(report.scenes.errors, 1);
    assert_eq!(report.scenes.skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_handles_events_and_ticks() {
    let bridge = bridge();
    // scene pushes fail so a recall adopts lights with no assumed state
    bridge.fail_on("evening");
    let settings = EngineSettings {
        update_interval: Duration::from_millis(20),
        transition_duration: Duration::from_millis(400),
    };
    let mut engine = Engine::initialize(bridge.clone(), schedule(), settings)
        .await
        .unwrap();

    let (tx, rx) = mpsc::channel(hue::EVENT_CHANNEL_CAPACITY);
    tx.send(scene_recall("evening")).await.unwrap();
    drop(tx);

    let handle = tokio::spawn(async move { engine.run(rx).await });
    tokio::time::sleep(Duration::from_millis(200)).await;

    // still ticking after the event channel closed
    assert!(!handle.is_finished());
    handle.abort();

    let updates = bridge.light_updates();
    assert_eq!(light_ids(&updates[..2]), vec!["ambiance", "dimmer"]);
    assert_eq!(updates[0].1.dynamics, Some(hue::Dynamics { duration: 400 }));
}

fn power_off(id: &str) -> hue::Event {
    update_event(json!({"id": id, "type": "light", "on": {"on": false}}))
}

#[tokio::test(start_paused = true)]
async fn test_run_skips_ticks_missed_during_slow_pass() {
    let bridge = bridge();
    // every command fails, so each pass retries both managed lights
    bridge.fail_on("ambiance");
    bridge.fail_on("dimmer");
    bridge.fail_on("evening");
    bridge.delay_light_updates(Duration::from_millis(3500));

    let settings = EngineSettings {
        update_interval: Duration::from_secs(1),
        transition_duration: Duration::from_secs(1),
    };
    let mut engine = Engine::initialize(bridge.clone(), schedule(), settings)
        .await
        .unwrap();

    let (tx, rx) = mpsc::channel(hue::EVENT_CHANNEL_CAPACITY);
    tx.send(scene_recall("evening")).await.unwrap();
    let handle = tokio::spawn(async move { engine.run(rx).await });

    // passes start at 0s (scene only), 1s and 8s; each light pass takes 7s
    tokio::time::sleep(Duration::from_secs(10)).await;
    tx.send(power_off("ambiance")).await.unwrap();
    tx.send(power_off("dimmer")).await.unwrap();

    tokio::time::sleep(Duration::from_secs(4)).await;
    // 14 periods have elapsed but only the two slow passes ran
    assert_eq!(bridge.light_attempts(), 4);
    assert_eq!(bridge.scene_attempts(), 2);
    assert_eq!(bridge.max_in_flight(), 1);

    // the overrides queued during the second pass are applied before the
    // third, so no further light commands are issued
    tokio::time::sleep(Duration::from_secs(16)).await;
    assert_eq!(bridge.light_attempts(), 4);
    assert!(bridge.scene_attempts() > 2);
    assert!(bridge.scene_attempts() < 30);
    assert_eq!(bridge.max_in_flight(), 1);

    handle.abort();
}
