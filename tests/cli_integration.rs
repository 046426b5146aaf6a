//! Command-line integration tests for callshield.
//!
//! Runs the built binary with HOME pointed at a temporary directory so the
//! default config location is fully controlled.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn callshield(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_callshield"))
        .args(args)
        .arg("--no-log-file")
        .env("HOME", home)
        .env_remove("CALLSHIELD_CONFIG")
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn write_default_config(home: &Path, json: &str) {
    let dir = home.join(".callshield");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.json"), json).unwrap();
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// Config loading
// =============================================================================

#[test]
fn test_invalid_default_config_is_reported() {
    let home = TempDir::new().unwrap();
    write_default_config(
        home.path(),
        r#"{"version": 1, "risk": {"thresholds": {"suspicious": 90, "scam": 50}}}"#,
    );

    let output = callshield(home.path(), &["scan", "urgent transfer the money"]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config.json"), "stderr: {stderr}");
    assert!(stderr.contains("risk thresholds"), "stderr: {stderr}");
}

#[test]
fn test_unparseable_default_config_is_reported() {
    let home = TempDir::new().unwrap();
    write_default_config(home.path(), "{ not json");

    let output = callshield(home.path(), &["scan", "hello"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse config"));
}

#[test]
fn test_default_config_thresholds_are_used() {
    let home = TempDir::new().unwrap();
    write_default_config(
        home.path(),
        r#"{"version": 1, "risk": {"thresholds": {"suspicious": 10, "scam": 20}}}"#,
    );

    let output = callshield(home.path(), &["scan", "this is urgent"]);

    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["risk"], 35);
    assert_eq!(report["label"], "scam");
}

#[test]
fn test_missing_config_uses_defaults() {
    let home = TempDir::new().unwrap();

    let output = callshield(home.path(), &["scan", "this is urgent"]);

    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["keywords"], serde_json::json!(["urgent"]));
    assert_eq!(report["label"], "suspicious");
}

// =============================================================================
// Convert
// =============================================================================

#[test]
fn test_convert_writes_ingest_rate_wav() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("call.wav");
    let output_path = home.path().join("call-16k.wav");

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 48_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&input, spec).unwrap();
    for i in 0..48_000 {
        let sample = ((i as f32 * 0.05).sin() * 8_000.0) as i16;
        writer.write_sample(sample).unwrap();
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();

    let output = callshield(
        home.path(),
        &[
            "convert",
            input.to_str().unwrap(),
            output_path.to_str().unwrap(),
        ],
    );

    assert!(output.status.success(), "{:?}", output);
    let report = stdout_json(&output);
    assert_eq!(report["sample_rate"], 16_000);
    assert_eq!(report["duration_seconds"], 1.0);

    let reader = hound::WavReader::open(&output_path).unwrap();
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.len(), 16_000);
}
