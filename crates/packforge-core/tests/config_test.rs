use std::time::Duration;

use packforge_core::PackforgeConfig;
use tempfile::TempDir;

#[test]
fn load_returns_defaults_when_no_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = PackforgeConfig::load(tmp.path()).unwrap();

    assert_eq!(config.project.product, "deceptus");
    assert_eq!(config.project.image_name, "deceptus_engine");
    assert_eq!(config.container.home, "/home/builder");
    assert_eq!(config.container.workdir, "/home/builder/deceptus_engine/build");
    assert_eq!(config.container.shell, "bash");
    assert!(config.timeouts.build_secs.is_none());
    assert!(config.timeouts.run_secs.is_none());
    assert_eq!(config.diagnostics.tail_lines, 50);
}

#[test]
fn load_parses_full_config() {
    let tmp = TempDir::new().unwrap();
    let toml = r#"
[project]
product = "engine"
image_name = "engine_builder"

[container]
home = "/home/ci"
workdir = "/home/ci/src/build"
shell = "sh"

[timeouts]
build_secs = 1800
run_secs = 600

[diagnostics]
tail_lines = 200
"#;
    std::fs::write(tmp.path().join("packforge.toml"), toml).unwrap();

    let config = PackforgeConfig::load(tmp.path()).unwrap();

    assert_eq!(config.project.product, "engine");
    assert_eq!(config.project.image_name, "engine_builder");
    assert_eq!(config.container.home, "/home/ci");
    assert_eq!(config.container.workdir, "/home/ci/src/build");
    assert_eq!(config.container.shell, "sh");
    assert_eq!(config.timeouts.build(), Some(Duration::from_secs(1800)));
    assert_eq!(config.timeouts.run(), Some(Duration::from_secs(600)));
    assert_eq!(config.diagnostics.tail_lines, 200);
}

#[test]
fn load_partial_config_fills_defaults() {
    let tmp = TempDir::new().unwrap();
    let toml = r#"
[project]
product = "partial"
"#;
    std::fs::write(tmp.path().join("packforge.toml"), toml).unwrap();

    let config = PackforgeConfig::load(tmp.path()).unwrap();

    assert_eq!(config.project.product, "partial");
    // Defaults preserved
    assert_eq!(config.project.image_name, "deceptus_engine");
    assert_eq!(config.container.home, "/home/builder");
    assert_eq!(config.diagnostics.tail_lines, 50);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("packforge.toml"), "not valid {{{{ toml").unwrap();

    let result = PackforgeConfig::load(tmp.path());
    assert!(result.is_err());

    let err = result.unwrap_err().to_string();
    assert!(err.contains("parse"));
}

#[test]
fn load_empty_config_returns_defaults() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("packforge.toml"), "").unwrap();

    let config = PackforgeConfig::load(tmp.path()).unwrap();
    assert_eq!(config.project.product, "deceptus");
}

#[test]
fn load_file_missing_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = PackforgeConfig::load_file(&tmp.path().join("elsewhere.toml"));

    assert!(matches!(
        result,
        Err(packforge_core::Error::ConfigLoad { .. })
    ));
}

// ── Mount points ──

#[test]
fn mounts_live_under_home() {
    let config = PackforgeConfig::default();

    assert_eq!(config.container.output_mount(), "/home/builder/output");
    assert_eq!(config.container.tools_mount(), "/home/builder/tools");
}

#[test]
fn mounts_ignore_trailing_slash_on_home() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("packforge.toml"),
        "[container]\nhome = \"/root/\"\n",
    )
    .unwrap();

    let config = PackforgeConfig::load(tmp.path()).unwrap();
    assert_eq!(config.container.output_mount(), "/root/output");
    assert_eq!(config.container.tools_mount(), "/root/tools");
}
