use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn ripplewall(config_dir: &std::path::Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ripplewall"));
    command
        .env("RIPPLEWALL_CONFIG_DIR", config_dir)
        .env("RUST_LOG", "warn");
    command
}

#[test]
fn config_where_reports_override_directory() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");

    let output = ripplewall(&config_dir)
        .args(["config", "where"])
        .output()
        .expect("failed to run ripplewall config where");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&config_dir.join("config.toml").display().to_string()));
    assert!(stdout.contains("missing"));
}

#[test]
fn config_check_prints_effective_settings() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "version = 1\n\n[render]\nopacity = 0.5\nframe_interval = \"20ms\"\n",
    )
    .unwrap();

    let output = ripplewall(&config_dir)
        .args(["config", "check"])
        .output()
        .expect("failed to run ripplewall config check");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("is valid"));
    assert!(stdout.contains("opacity = 0.5"));
    assert!(stdout.contains("frame_interval = \"20ms\""));
}

#[test]
fn config_check_without_file_uses_defaults() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");

    let output = ripplewall(&config_dir)
        .args(["config", "check"])
        .output()
        .expect("failed to run ripplewall config check");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("using defaults"));
    assert!(stdout.contains("[render]"));
    assert!(stdout.contains("vsync = true"));
}

#[test]
fn config_check_rejects_invalid_file() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    let custom = root.path().join("broken.toml");
    fs::write(&custom, "[render]\nopacity = 1.5\n").unwrap();

    let output = ripplewall(&config_dir)
        .args(["config", "check"])
        .arg(&custom)
        .output()
        .expect("failed to run ripplewall config check");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.toml"));
    assert!(stderr.contains("opacity"));
}
