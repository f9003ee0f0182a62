//! Loading configuration files and wiring them into the primitives.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use service_resilience::clock::ManualClock;
use service_resilience::config::{load_config, parse_config, ConfigError, LogFormat, ValidationError};
use service_resilience::health::{AdvisorRegistry, HealthState};
use service_resilience::resilience::RetryPolicy;

const SAMPLE: &str = r#"
[health]
max_failure_count = 2
unhealthy_duration_secs = 10

[retry]
max_attempts = 4
initial_backoff_ms = 100
max_backoff_ms = 300

[observability]
log_level = "debug"
log_format = "compact"

[[resources]]
name = "smtp"

[[resources]]
name = "sftp"
[resources.health]
max_failure_count = 0
unhealthy_duration_secs = -5
extend_duration_on_immediate_failure = true
"#;

#[test]
fn test_load_config_from_file() {
    let path = std::env::temp_dir().join(format!("service-resilience-{}.toml", std::process::id()));
    fs::write(&path, SAMPLE).unwrap();

    let config = load_config(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(config.observability.log_format, LogFormat::Compact);
    assert_eq!(config.resources.len(), 2);

    let policy = RetryPolicy::from(&config.retry);
    assert_eq!(policy.max_attempts, 4);
    let delays: Vec<_> = policy.backoff().take(3).collect();
    assert_eq!(
        delays,
        vec![Duration::from_millis(100), Duration::from_millis(200), Duration::from_millis(300)]
    );
}

#[test]
fn test_registry_applies_defaults_and_normalized_overrides() {
    let config = parse_config(SAMPLE).unwrap();
    let clock = ManualClock::new();
    let registry = AdvisorRegistry::from_config_with_clock(&config, Arc::new(clock.clone()));

    let smtp = registry.get("smtp").unwrap();
    smtp.record_failure();
    smtp.record_failure();
    assert!(!smtp.is_healthy());
    clock.advance(Duration::from_secs(10));
    assert!(smtp.is_healthy());

    // Non-positive overrides fall back to 3 failures / 60 seconds.
    let sftp = registry.get("sftp").unwrap();
    sftp.record_failure();
    sftp.record_failure();
    assert!(sftp.is_healthy());
    sftp.record_failure();
    assert!(!sftp.is_healthy());
    clock.advance(Duration::from_secs(59));
    assert!(!sftp.is_healthy());
    clock.advance(Duration::from_secs(1));
    assert!(sftp.is_healthy());
    assert_eq!(sftp.failure_count(), 3);

    // Undeclared resources use the root defaults.
    let other = registry.get_or_create("other");
    other.record_failure();
    other.record_failure();
    let views = registry.snapshot();
    let names: Vec<_> = views.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["other", "sftp", "smtp"]);
    assert_eq!(views[0].state, HealthState::Unhealthy);
}

#[test]
fn test_invalid_config_reports_every_problem() {
    let err = parse_config(
        r#"
        [retry]
        max_attempts = 0

        [[resources]]
        name = "db"

        [[resources]]
        name = "db"
        "#,
    )
    .unwrap_err();

    match err {
        ConfigError::Validation(errors) => assert_eq!(
            errors,
            vec![ValidationError::ZeroAttempts, ValidationError::DuplicateResource("db".into())]
        ),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_maximal_cooldown_from_config_does_not_panic() {
    let config = parse_config(
        "[health]\nmax_failure_count = 1\nunhealthy_duration_secs = 9223372036854775807\n",
    )
    .unwrap();
    let registry = AdvisorRegistry::from_config(&config);
    let db = registry.get_or_create("db");

    db.record_failure();
    assert!(!db.is_healthy());

    db.record_failure();
    assert!(!db.is_healthy());
    assert_eq!(db.failure_count(), 2);
}
