use std::process::Command;

#[test]
fn test_cli_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "mdp_cli", "--", "--help"])
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to run CLI with --help");

    assert!(output.status.success(), "CLI --help should exit with code 0. stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mdp"), "help output should name the binary");
}

#[test]
fn test_cli_version() {
    let output = Command::new("cargo")
        .args(["run", "-p", "mdp_cli", "--", "--version"])
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to run CLI with --version");

    assert!(output.status.success(), "CLI --version should exit with code 0. stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(!output.stdout.is_empty(), "version output should not be empty");
}

#[test]
fn test_cli_rejects_unknown_stage() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.md");
    std::fs::write(&input, "Hello world.").unwrap();

    let output = Command::new("cargo")
        .args(["run", "-p", "mdp_cli", "--", input.to_str().unwrap(), "--steps", "bogus", "--dry-run"])
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to run CLI");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown stage"));
}

#[test]
fn test_cli_runs_dry_run_without_model_clients() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.md");
    std::fs::write(&input, "STOP yelling!! `code` stays put.").unwrap();

    let output = Command::new("cargo")
        .args([
            "run",
            "-p",
            "mdp_cli",
            "--",
            input.to_str().unwrap(),
            "--steps",
            "mask,prepass-basic,prepass-advanced,scrubber,apply",
            "--dry-run",
        ])
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to run CLI");

    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
}
