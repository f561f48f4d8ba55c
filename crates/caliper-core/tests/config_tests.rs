use std::io::Write;

use caliper_contract::Profile;
use caliper_core::config::{
    ConfigError, HarnessConfig, RuntimeKind, MAX_ENTROPY_LEN, MAX_TRUNCATE_SIZE,
};
use caliper_rut::runtime::DenialPosture;

#[test]
fn test_empty_object_yields_defaults() {
    let config = HarnessConfig::from_json("{}").unwrap();
    assert_eq!(config.runtime, RuntimeKind::Host);
    assert_eq!(config.profile, None);
    assert_eq!(config.preopen, "caliper.dir");
    assert_eq!(config.probes.truncate.grow_to, 500);
    assert_eq!(config.probes.truncate.shrink_to, 300);
    assert_eq!(config.probes.entropy.single_len, 256);
    assert_eq!(config.probes.thread.sleep_ms, 1000);
    assert_eq!(config.probes.thread.slack_ms, 500);
    assert!(config.only.is_empty());
    config.validate().unwrap();
}

#[test]
fn test_partial_sections_keep_other_defaults() {
    let config = HarnessConfig::from_json(
        r#"{
            "runtime": "memory",
            "profile": "capability-sandboxed",
            "probes": { "thread": { "sleep_ms": 20 } },
            "memory": { "path_denial": "not-capable", "args": ["prog", "a", "b"] },
            "expect": { "environ": ["X=1"] },
            "only": ["fileopen"]
        }"#,
    )
    .unwrap();
    assert_eq!(config.runtime, RuntimeKind::Memory);
    assert_eq!(config.profile, Some(Profile::CapabilitySandboxed));
    assert_eq!(config.probes.thread.sleep_ms, 20);
    assert_eq!(config.probes.thread.slack_ms, 500);
    assert_eq!(config.memory.path_denial, DenialPosture::NotCapable);
    assert_eq!(config.memory.entropy_call_cap, Some(256));
    assert_eq!(config.memory.args, vec!["prog", "a", "b"]);
    assert_eq!(config.expect.environ, Some(vec!["X=1".to_string()]));
    assert_eq!(config.expect.args, None);
}

#[test]
fn test_metadata_section_parses() {
    let config = HarnessConfig::from_json(
        r#"{ "metadata": { "name": "wasi-host", "path_denial": "not-capable" } }"#,
    )
    .unwrap();
    let meta = config.metadata.unwrap();
    assert_eq!(meta.name, "wasi-host");
    assert_eq!(meta.path_denial, Some(DenialPosture::NotCapable));
    assert!(meta.threads);
}

#[test]
fn test_malformed_json_is_parse_error() {
    assert!(matches!(
        HarnessConfig::from_json("{ runtime: "),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        HarnessConfig::from_json(r#"{ "runtime": "vm" }"#),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "runtime": "memory", "preopen": "work" }}"#).unwrap();
    let config = HarnessConfig::load(file.path()).unwrap();
    assert_eq!(config.runtime, RuntimeKind::Memory);
    assert_eq!(config.preopen, "work");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = HarnessConfig::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn test_validation_rejects_unusable_settings() {
    let mut config = HarnessConfig::default();
    config.preopen = "../escape".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let mut config = HarnessConfig::default();
    config.probes.entropy.stride = 0;
    assert!(config.validate().is_err());

    let mut config = HarnessConfig::default();
    config.probes.thread.poll_ms = 0;
    assert!(config.validate().is_err());

    let mut config = HarnessConfig::default();
    config.memory.max_open_files = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_only_prefix_selection() {
    let mut config = HarnessConfig::default();
    assert!(config.selects("anything"));
    config.only = vec!["clock.".to_string()];
    assert!(config.selects("clock.time"));
    assert!(!config.selects("entropy.single"));
}

#[test]
fn test_runtime_kind_from_str() {
    assert_eq!("memory".parse::<RuntimeKind>().unwrap(), RuntimeKind::Memory);
    assert_eq!("host".parse::<RuntimeKind>().unwrap(), RuntimeKind::Host);
    assert!("vm".parse::<RuntimeKind>().is_err());
}

#[test]
fn test_validation_bounds_probe_sizes() {
    let mut config = HarnessConfig::default();
    config.probes.truncate.grow_to = 1 << 46;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    config.probes.truncate.grow_to = MAX_TRUNCATE_SIZE;
    assert!(config.validate().is_ok());

    let mut config = HarnessConfig::default();
    config.probes.entropy.strided_len = MAX_ENTROPY_LEN + 1;
    assert!(config.validate().is_err());

    let mut config = HarnessConfig::default();
    config.probes.entropy.single_len = usize::MAX;
    assert!(config.validate().is_err());
}

#[test]
fn test_thread_slack_must_cover_one_poll() {
    let mut config = HarnessConfig::default();
    config.probes.thread.slack_ms = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    config.probes.thread.slack_ms = config.probes.thread.poll_ms;
    assert!(config.validate().is_ok());
}
