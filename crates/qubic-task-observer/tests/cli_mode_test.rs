use std::process::Command;

#[test]
fn cli_check_with_config_works() {
    let binary_path = env!("CARGO_BIN_EXE_qubic-task-observer");

    let config_path = format!("{}/examples/observer.yaml", env!("CARGO_MANIFEST_DIR"));

    let output = Command::new(binary_path)
        .arg("--config")
        .arg(config_path)
        .arg("--log-level")
        .arg("error")
        .arg("check")
        .output()
        .expect("Failed to start qubic-task-observer binary");

    assert!(
        output.status.success(),
        "Process exited with non-zero status: {}\nStdout: {}\nStderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration OK"));
}

#[test]
fn cli_check_rejects_invalid_config() {
    let binary_path = env!("CARGO_BIN_EXE_qubic-task-observer");

    let dir = std::env::temp_dir().join(format!("qubic-observer-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let config_path = dir.join("bad.yaml");
    std::fs::write(&config_path, "polling:\n  interval_ms: 0\n").expect("write config");

    let output = Command::new(binary_path)
        .arg("--config")
        .arg(&config_path)
        .arg("check")
        .output()
        .expect("Failed to start qubic-task-observer binary");

    assert!(!output.status.success());
    let _ = std::fs::remove_dir_all(&dir);
}
