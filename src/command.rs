//! Subprocess capability shared by probes, detectors, and update actions
//!
//! Every shell-out in the crate goes through the [`CommandRunner`] trait so
//! that probing and detection logic can be tested against scripted output
//! instead of a live system.

use std::io;
use std::process::Command;

/// Captured result of one subprocess invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Process exit code (-1 when terminated by a signal)
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Creates an output with the given exit code and streams
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Creates a successful output with only stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::new(0, stdout, "")
    }

    /// Returns true if the process exited with code zero
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a subprocess and captures its output.
///
/// `Err` means the process could not be launched at all (binary missing,
/// permission denied); a launched process that exits non-zero is an `Ok`
/// with a non-zero `exit_code`. Callers decide which of the two counts as
/// "absent" versus "failed" for their own contract.
pub trait CommandRunner: Send + Sync + std::fmt::Debug {
    /// Run `argv[0]` with `argv[1..]` as arguments
    fn run(&self, argv: &[String]) -> io::Result<CommandOutput>;
}

/// CommandRunner that executes real subprocesses
#[derive(Debug, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    /// Create a new system command runner
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, argv: &[String]) -> io::Result<CommandOutput> {
        let Some((program, args)) = argv.split_first() else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
        };

        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Convenience for building argv vectors from string literals
pub fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}


#[cfg(test)]
mod tests {
    use super::fake::FakeRunner;
    use super::*;

    #[test]
    fn test_command_output_success() {
        assert!(CommandOutput::ok("hello").success());
        assert!(!CommandOutput::new(1, "", "boom").success());
    }

    #[test]
    fn test_argv_helper() {
        assert_eq!(
            argv(&["git", "ls-remote", "origin"]),
            vec!["git".to_string(), "ls-remote".to_string(), "origin".to_string()]
        );
    }

    #[test]
    fn test_system_runner_empty_command() {
        let runner = SystemCommandRunner::new();
        let result = runner.run(&[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_system_runner_missing_binary() {
        let runner = SystemCommandRunner::new();
        let result = runner.run(&argv(&["sysup-test-definitely-not-a-binary"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_fake_runner_scripted() {
        let runner = FakeRunner::new().script("echo hi", CommandOutput::ok("hi\n"));
        let out = runner.run(&argv(&["echo", "hi"])).unwrap();
        assert_eq!(out.stdout, "hi\n");
        assert!(out.success());
    }

    #[test]
    fn test_fake_runner_unknown_command() {
        let runner = FakeRunner::new();
        assert!(runner.run(&argv(&["unknown"])).is_err());
    }

    #[test]
    fn test_fake_runner_records_calls() {
        let runner = FakeRunner::new().script("a b", CommandOutput::ok(""));
        let _ = runner.run(&argv(&["a", "b"]));
        let _ = runner.run(&argv(&["c"]));
        assert_eq!(runner.calls(), vec!["a b".to_string(), "c".to_string()]);
    }
}
