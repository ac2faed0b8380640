//! Integration tests for rally-copilot
//!
//! Library tests drive a controller end to end through a live position
//! channel. CLI tests run the built binary against route fixtures written to
//! a temporary directory; simulated runs use zero delays so they finish fast.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use assert_cmd::Command;
use parking_lot::Mutex;
use predicates::prelude::*;
use rally_copilot::{
    NavigationConfig, NavigationController, PositionSource, PositionUpdate, TrackerState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Three steps one degree of longitude apart along the equator
const ROUTE: &str = r#"{
    "summary": "Equator Stage",
    "legs": [{
        "start_address": "Service Park",
        "end_address": "Flying Finish",
        "distance": { "text": "222 km", "value": 222390 },
        "duration": { "text": "2 hours", "value": 7200 },
        "steps": [
            { "end_location": { "lat": 0.0, "lng": 0.0 },
              "distance": { "text": "0.6 km", "value": 600 },
              "duration": { "text": "1 min", "value": 40 },
              "maneuver": "turn-left",
              "html_instructions": "Turn <b>left</b> onto <b>Stage Rd</b>" },
            { "end_location": { "lat": 0.0, "lng": 1.0 },
              "distance": { "text": "0.3 km", "value": 300 },
              "duration": { "text": "1 min", "value": 20 },
              "maneuver": "turn-slight-right",
              "html_instructions": "Slight <b>right</b>" },
            { "end_location": { "lat": 0.0, "lng": 2.0 },
              "distance": { "text": "0.2 km", "value": 150 },
              "duration": { "text": "1 min", "value": 15 },
              "maneuver": "roundabout-left",
              "html_instructions": "At the roundabout, take the <b>2nd</b> exit" }
        ]
    }]
}"#;

const EXPECTED_CALLOUTS: [&str; 3] = [
    "Three left!, 600 meters",
    "Flat right, 300",
    "Roundabout ahead, 150",
];

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn rally_copilot() -> Command {
    Command::cargo_bin("rally-copilot").unwrap()
}

fn navigate(route: &Path) -> Command {
    let mut cmd = rally_copilot();
    cmd.arg(route).timeout(Duration::from_secs(30));
    cmd
}

#[tokio::test]
async fn test_live_navigation_end_to_end() {
    let shown = Arc::new(Mutex::new(Vec::new()));
    let spoken = Arc::new(Mutex::new(Vec::new()));
    let display = {
        let shown = Arc::clone(&shown);
        move |text: &str| shown.lock().push(text.to_string())
    };
    let speech = {
        let spoken = Arc::clone(&spoken);
        move |text: &str| spoken.lock().push(text.to_string())
    };

    let controller =
        NavigationController::new(NavigationConfig::default(), Arc::new(speech), Arc::new(display))
            .unwrap();
    controller.set_route(&rally_copilot::parse_route(ROUTE).unwrap()).unwrap();

    let (tx, rx) = mpsc::channel(16);
    let driver = controller.start(PositionSource::Live(rx)).unwrap();

    // far away, malformed, then each waypoint in turn
    tx.send(PositionUpdate::new(10.0, 10.0)).await.unwrap();
    tx.send(PositionUpdate { latitude: None, longitude: Some(0.0) }).await.unwrap();
    for lng in [0.0, 0.0005, 1.0, 2.0, 2.0] {
        tx.send(PositionUpdate::new(0.0, lng)).await.unwrap();
    }
    drop(tx);
    driver.await.unwrap();

    assert_eq!(*shown.lock(), EXPECTED_CALLOUTS);
    assert_eq!(*spoken.lock(), EXPECTED_CALLOUTS);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, TrackerState::Complete);
    assert_eq!(snapshot.next_index, 3);
    assert!(snapshot.active);
}

#[test]
fn test_cli_dry_run_prints_every_callout() {
    let dir = TempDir::new().unwrap();
    let route = write_fixture(&dir, "route.json", ROUTE);

    navigate(&route)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(format!("{}\n", EXPECTED_CALLOUTS.join("\n")))
        .stderr(predicate::str::contains("From: Service Park"))
        .stderr(predicate::str::contains("To: Flying Finish"));
}

#[test]
fn test_cli_simulated_replay() {
    let dir = TempDir::new().unwrap();
    let route = write_fixture(&dir, "route.json", ROUTE);

    navigate(&route)
        .args(["--simulate", "--start-delay", "0", "--interval", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains(">> Three left!, 600 meters"))
        .stdout(predicate::str::contains(">> Flat right, 300"))
        .stdout(predicate::str::contains(">> Roundabout ahead, 150"))
        .stderr(predicate::str::contains("Reached 3/3 waypoints"));
}

#[test]
fn test_cli_simulated_replay_stops_after_max() {
    let dir = TempDir::new().unwrap();
    let route = write_fixture(&dir, "route.json", ROUTE);

    navigate(&route)
        .args(["--start-delay", "0", "--interval", "0", "--max-simulated", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(">> Three left!, 600 meters"))
        .stdout(predicate::str::contains("Flat right").not())
        .stderr(predicate::str::contains("Reached 1/3 waypoints"));
}

#[test]
fn test_cli_positions_file() {
    let dir = TempDir::new().unwrap();
    let route = write_fixture(&dir, "route.json", ROUTE);
    let positions = write_fixture(
        &dir,
        "positions.jsonl",
        "# warm-up\n\
         {\"lat\": 5.0, \"lon\": 5.0}\n\
         {\"lat\": 0.0, \"lon\": 0.0}\n\
         not a position\n\
         {\"lat\": 0.0, \"lon\": 1.0}\n",
    );

    navigate(&route)
        .arg("--positions")
        .arg(&positions)
        .assert()
        .success()
        .stdout(">> Three left!, 600 meters\n>> Flat right, 300\n")
        .stderr(predicate::str::contains("Reached 2/3 waypoints"));
}

#[test]
fn test_cli_positions_from_stdin() {
    let dir = TempDir::new().unwrap();
    let route = write_fixture(&dir, "route.json", ROUTE);

    navigate(&route)
        .args(["--positions", "-"])
        .write_stdin("{\"lat\": 0.0, \"lon\": 0.0}\n{\"lat\": 0.0, \"lon\": 1.0}\n{\"lat\": 0.0, \"lon\": 2.0}\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(">> Roundabout ahead, 150"));
}

#[test]
fn test_cli_threshold_flag() {
    let dir = TempDir::new().unwrap();
    let route = write_fixture(&dir, "route.json", ROUTE);
    // ~111 m from the first waypoint
    let positions = write_fixture(&dir, "positions.jsonl", "{\"lat\": 0.001, \"lon\": 0.0}\n");

    navigate(&route)
        .arg("--positions")
        .arg(&positions)
        .args(["--threshold", "50"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    navigate(&route)
        .arg("--positions")
        .arg(&positions)
        .assert()
        .success()
        .stdout(">> Three left!, 600 meters\n");
}

#[test]
fn test_cli_directions_response() {
    let dir = TempDir::new().unwrap();
    let ok = write_fixture(
        &dir,
        "ok.json",
        &format!(r#"{{ "status": "OK", "routes": [{ROUTE}] }}"#),
    );
    let denied = write_fixture(
        &dir,
        "denied.json",
        r#"{ "status": "REQUEST_DENIED", "error_message": "The provided API key is invalid.", "routes": [] }"#,
    );

    navigate(&ok)
        .args(["--directions", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Roundabout ahead, 150"));

    navigate(&denied)
        .args(["--directions", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key issue"));
}

#[test]
fn test_cli_malformed_route_fails() {
    let dir = TempDir::new().unwrap();
    let no_legs = write_fixture(&dir, "no-legs.json", r#"{ "summary": "A46" }"#);
    let bad_step = write_fixture(
        &dir,
        "bad-step.json",
        r#"{ "legs": [{ "steps": [{ "maneuver": "turn-left" }] }] }"#,
    );

    navigate(&no_legs)
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed route"));

    navigate(&bad_step)
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("end_location"));

    navigate(&dir.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load route"));
}

#[test]
fn test_cli_rejects_conflicting_sources() {
    let dir = TempDir::new().unwrap();
    let route = write_fixture(&dir, "route.json", ROUTE);

    navigate(&route)
        .args(["--simulate", "--positions", "-"])
        .assert()
        .failure();
}

#[test]
fn test_cli_rejects_bad_config() {
    let dir = TempDir::new().unwrap();
    let route = write_fixture(&dir, "route.json", ROUTE);
    let config = write_fixture(&dir, "copilot.json", r#"{ "proximity_threshold_m": 0 }"#);

    navigate(&route)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}

#[test]
fn test_cli_version() {
    rally_copilot()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
