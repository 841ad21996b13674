use serial_test::serial;
use std::fs;
use tempfile::tempdir;

use slotwise::args::{BucketArgs, CliAction, ParsedArgs};
use slotwise::commands::bucket::bucket_from_file;
use slotwise::commands::current_time;
use slotwise::commands::resolve::resolve_request;
use slotwise::{Config, SlotwiseError};

fn create_test_config_file(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("slotwise").join("slotwise.toml");

    fs::create_dir_all(config_path.parent().unwrap()).unwrap();
    fs::write(&config_path, content).unwrap();

    (temp_dir, config_path)
}

fn resolve_args(args: &[&str]) -> slotwise::args::ResolveArgs {
    let mut full = vec!["slotwise", "resolve"];
    full.extend_from_slice(args);
    match ParsedArgs::parse(full).action {
        CliAction::Resolve(args) => args,
        other => panic!("expected resolve, got {:?}", other),
    }
}

#[test]
fn test_integration_resolve_in_configured_zone() {
    let (_temp_dir, config_path) = create_test_config_file(
        r#"
timezone = "Europe/London"
slot_step_minutes = 30

[[appliances]]
name = "Dishwasher"
runtime_min = 90
"#,
    );
    let config = Config::load_from_path(&config_path).unwrap();
    let tz = config.time_zone().unwrap();

    // 13:10 UTC is 14:10 BST
    let args = resolve_args(&["-a", "dishwasher", "--now", "2024-06-03T13:10:00Z"]);
    let now = current_time(args.now.as_deref(), &tz).unwrap();
    let request = resolve_request(&config, &args, &now).unwrap();

    assert_eq!(
        request.earliest_start.unwrap().to_rfc3339(),
        "2024-06-03T14:30:00+01:00"
    );
    assert_eq!(
        request.latest_end.unwrap().to_rfc3339(),
        "2024-06-04T23:30:00+01:00"
    );
}

#[test]
fn test_integration_resolve_across_spring_forward() {
    let (_temp_dir, config_path) = create_test_config_file("timezone = \"Europe/London\"");
    let config = Config::load_from_path(&config_path).unwrap();
    let tz = config.time_zone().unwrap();

    let args = resolve_args(&[
        "-a",
        "Dryer",
        "--from",
        "today@20:00",
        "--until",
        "tomorrow@09:00",
        "--now",
        "2024-03-30T12:00:00Z",
    ]);
    let now = current_time(args.now.as_deref(), &tz).unwrap();
    let request = resolve_request(&config, &args, &now).unwrap();

    assert_eq!(
        request.earliest_start.unwrap().to_rfc3339(),
        "2024-03-30T20:00:00+00:00"
    );
    assert_eq!(
        request.latest_end.unwrap().to_rfc3339(),
        "2024-03-31T09:00:00+01:00"
    );
}

#[test]
fn test_integration_custom_grid_rejects_off_grid_bound() {
    let (_temp_dir, config_path) = create_test_config_file(
        r#"
slot_step_minutes = 60
day_start = "06:00"
day_end = "22:00"
"#,
    );
    let config = Config::load_from_path(&config_path).unwrap();
    let now = current_time(Some("2024-01-01T10:00:00Z"), &chrono::Utc).unwrap();

    let on_grid = resolve_args(&["-a", "Dryer", "--from", "tomorrow@07:00"]);
    let request = resolve_request(&config, &on_grid, &now).unwrap();
    assert_eq!(
        request.latest_end.unwrap().to_rfc3339(),
        "2024-01-02T22:00:00+00:00"
    );

    let off_grid = resolve_args(&["-a", "Dryer", "--from", "tomorrow@07:30"]);
    assert!(resolve_request(&config, &off_grid, &now).is_err());
}

#[test]
fn test_integration_reject_policy() {
    let (_temp_dir, config_path) = create_test_config_file("empty_preference = \"reject\"");
    let config = Config::load_from_path(&config_path).unwrap();
    let now = current_time(Some("2024-01-01T10:00:00Z"), &chrono::Utc).unwrap();

    let err = resolve_request(&config, &resolve_args(&["-a", "Dryer", "--prefer"]), &now)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<SlotwiseError>(),
        Some(&SlotwiseError::AmbiguousTimePreference)
    );
}

#[test]
fn test_integration_bucket_in_configured_zone() {
    let (temp_dir, config_path) = create_test_config_file("timezone = \"Europe/London\"");
    let config = Config::load_from_path(&config_path).unwrap();
    let tz = config.time_zone().unwrap();

    let events_path = temp_dir.path().join("events.json");
    fs::write(
        &events_path,
        r#"{"alice": [
            {"appliance_name": "Dryer", "start_time": "2024-06-03T23:30:00Z"},
            {"appliance_name": "Dishwasher", "start_time": "2024-06-03T07:00:00"},
            {"appliance_name": "Heating System", "start_time": "2024-06-04T12:00:00+01:00"}
        ]}"#,
    )
    .unwrap();

    let args = BucketArgs {
        events: events_path,
        user: Some("alice".to_string()),
        now: Some("2024-06-03T09:00:00Z".to_string()),
    };
    let now = current_time(args.now.as_deref(), &tz).unwrap();
    let buckets = bucket_from_file(&args, &now).unwrap();

    // 23:30Z is 00:30 BST on the 4th, so the dryer belongs to tomorrow
    assert_eq!(buckets.today.len(), 1);
    assert_eq!(buckets.today[0].event.appliance_name, "Dishwasher");
    assert!(buckets.today[0].is_past);
    let tomorrow: Vec<_> = buckets
        .tomorrow
        .iter()
        .map(|e| e.event.appliance_name.as_str())
        .collect();
    assert_eq!(tomorrow, vec!["Dryer", "Heating System"]);
}

#[test]
#[serial]
fn test_integration_bucket_user_falls_back_to_environment() {
    let temp_dir = tempdir().unwrap();
    let events_path = temp_dir.path().join("events.json");
    fs::write(
        &events_path,
        r#"{"slotwise-tester": [{"appliance_name": "Dryer", "start_time": "2024-01-01T12:00:00Z"}]}"#,
    )
    .unwrap();

    let original = std::env::var_os("USER");
    unsafe {
        std::env::set_var("USER", "slotwise-tester");
    }

    let args = BucketArgs {
        events: events_path,
        user: None,
        now: None,
    };
    let now = current_time(Some("2024-01-01T10:00:00Z"), &chrono::Utc).unwrap();
    let result = bucket_from_file(&args, &now);

    unsafe {
        match original {
            Some(value) => std::env::set_var("USER", value),
            None => std::env::remove_var("USER"),
        }
    }

    assert_eq!(result.unwrap().today.len(), 1);
}

#[test]
#[serial]
fn test_integration_missing_user() {
    let temp_dir = tempdir().unwrap();
    let events_path = temp_dir.path().join("events.json");
    fs::write(&events_path, "[]").unwrap();

    let original = std::env::var_os("USER");
    unsafe {
        std::env::remove_var("USER");
    }

    let args = BucketArgs {
        events: events_path,
        user: None,
        now: None,
    };
    let now = current_time(Some("2024-01-01T10:00:00Z"), &chrono::Utc).unwrap();
    let result = bucket_from_file(&args, &now);

    unsafe {
        if let Some(value) = original {
            std::env::set_var("USER", value);
        }
    }

    let err = result.unwrap_err();
    assert_eq!(
        err.downcast_ref::<SlotwiseError>(),
        Some(&SlotwiseError::MissingUser)
    );
}
