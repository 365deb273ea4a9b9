// CLI checks that run without a TTY: --list and the tty guard itself.

use assert_cmd::Command;

#[test]
fn list_prints_bundled_contests() {
    let output = Command::cargo_bin("examr")
        .unwrap()
        .arg("--list")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("demo"));
    assert!(stdout.contains("jee-mock-12"));
    assert!(stdout.contains("JEE Mock Test #12"));
}

#[test]
fn refuses_to_run_without_a_tty() {
    let storage = tempfile::tempdir().unwrap();
    let output = Command::cargo_bin("examr")
        .unwrap()
        .args(["demo", "--storage-dir"])
        .arg(storage.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tty"));
}

#[test]
fn unknown_contest_is_a_usage_error() {
    let output = Command::cargo_bin("examr")
        .unwrap()
        .arg("does-not-exist")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does-not-exist"));
}
