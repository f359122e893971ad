//! End-to-end tests for the sysup CLI
//!
//! These tests verify:
//! - Exit codes for fatal and clean runs
//! - Descriptor warnings on stderr-visible output
//! - JSON report schema
//!
//! Every scenario here is network-free: targets either fail to load, are
//! absent (detection reads a missing file), or the directory is empty.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn sysup() -> Command {
    Command::cargo_bin("sysup").expect("binary builds")
}

/// A target whose detection reads a file that does not exist: decision is
/// "not installed" without ever probing, so no network is touched
fn absent_target(id: &str) -> String {
    format!(
        r#"
id = "{id}"
display_name = "{id}"

[detection]
kind = "file-read"
path = "/nonexistent/sysup-e2e/{id}.version"

[source]
kind = "npm"
package = "{id}"

[action]
command = ["npm", "install", "-g", "{id}"]
"#
    )
}

mod fatal_errors {
    use super::*;

    /// Missing targets directory aborts with the general error code
    #[test]
    fn test_missing_targets_dir() {
        sysup()
            .arg("/definitely/not/a/targets/dir")
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("targets directory not found"));
    }
}

mod clean_runs {
    use super::*;

    /// An empty targets directory is a successful no-op
    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        sysup()
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("no targets to process"));
    }

    /// Absent targets report cleanly with exit code 0
    #[test]
    fn test_absent_target_is_success() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("tool.toml"), absent_target("tool")).unwrap();

        sysup()
            .arg(dir.path())
            .arg("--quiet")
            .assert()
            .success()
            .stdout(predicate::str::contains("not installed"));
    }
}

mod descriptor_warnings {
    use super::*;

    /// A malformed descriptor is reported but does not fail the run
    #[test]
    fn test_malformed_descriptor_warns_and_continues() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.toml"), "this [ is not toml").unwrap();
        fs::write(dir.path().join("tool.toml"), absent_target("tool")).unwrap();

        sysup()
            .arg(dir.path())
            .arg("--quiet")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("warning:")
                    .and(predicate::str::contains("bad.toml"))
                    .and(predicate::str::contains("not installed")),
            );
    }

    /// Unknown source kinds are load-time warnings
    #[test]
    fn test_unknown_source_kind_warns() {
        let dir = TempDir::new().unwrap();
        let descriptor = absent_target("tool").replace("kind = \"npm\"", "kind = \"gopher\"");
        fs::write(dir.path().join("tool.toml"), descriptor).unwrap();

        sysup()
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("unknown source kind 'gopher'"));
    }
}

mod json_output {
    use super::*;

    /// The JSON report parses and carries the documented shape
    #[test]
    fn test_json_schema() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.toml"), "broken [").unwrap();
        fs::write(dir.path().join("tool.toml"), absent_target("tool")).unwrap();

        let output = sysup()
            .arg(dir.path())
            .arg("--json")
            .output()
            .expect("command runs");
        assert!(output.status.success());

        let report: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("stdout is a JSON document");

        assert_eq!(report["dry_run"], false);
        assert_eq!(report["interrupted"], false);
        assert_eq!(report["warnings"].as_array().unwrap().len(), 1);

        let targets = report["targets"].as_array().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0]["id"], "tool");
        assert_eq!(targets[0]["decision"]["status"], "absent");
        assert_eq!(targets[0]["action"]["disposition"], "not_needed");
    }

    /// Dry-run mode is visible in the JSON report
    #[test]
    fn test_json_dry_run_flag() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("tool.toml"), absent_target("tool")).unwrap();

        let output = sysup()
            .arg(dir.path())
            .args(["--json", "--dry-run"])
            .output()
            .expect("command runs");

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["dry_run"], true);
    }
}

mod target_filters {
    use super::*;

    /// --only restricts processing to the named targets
    #[test]
    fn test_only_filter() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.toml"), absent_target("a")).unwrap();
        fs::write(dir.path().join("b.toml"), absent_target("b")).unwrap();

        let output = sysup()
            .arg(dir.path())
            .args(["--json", "--only", "b"])
            .output()
            .expect("command runs");

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let targets = report["targets"].as_array().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0]["id"], "b");
    }

    /// --exclude removes the named targets
    #[test]
    fn test_exclude_filter() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.toml"), absent_target("a")).unwrap();
        fs::write(dir.path().join("b.toml"), absent_target("b")).unwrap();

        let output = sysup()
            .arg(dir.path())
            .args(["--json", "--exclude", "a"])
            .output()
            .expect("command runs");

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let targets = report["targets"].as_array().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0]["id"], "b");
    }
}

mod cli_surface {
    use super::*;

    #[test]
    fn test_help() {
        sysup()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("update"));
    }

    #[test]
    fn test_version() {
        sysup()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("sysup"));
    }
}
