//! Test helpers for behavioral specifications.
//!
//! Black-box: invokes the `netcfg` binary against a throwaway SQLite file and
//! verifies stdout/stderr/exit codes, the way the CLI itself is actually run.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Resolves a workspace binary, honoring `CARGO_BIN_EXE_<name>` when cargo
/// sets it for an integration test, falling back to the debug target dir.
fn binary_path(name: &str) -> PathBuf {
    let env_key = format!("CARGO_BIN_EXE_{name}");
    if let Ok(path) = std::env::var(&env_key) {
        return PathBuf::from(path);
    }
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir.join("target/debug").join(name)
}

fn netcfg_binary() -> PathBuf {
    binary_path("netcfg")
}

/// Create a CLI builder for `netcfg` commands against a fresh database.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self { args: Vec::new(), envs: Vec::new() }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.envs.push((key.to_string(), value.as_ref().to_string()));
        self
    }

    fn command(self) -> Command {
        let mut cmd = Command::new(netcfg_binary());
        cmd.args(&self.args);
        cmd.env_remove("DATABASE_URL");
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}",
            String::from_utf8_lossy(&output.stdout)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{expected}'\nstderr: {stderr}");
        self
    }
}

/// A throwaway device-registry database, isolated per test.
pub struct Fleet {
    dir: tempfile::TempDir,
}

impl Fleet {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().expect("tempdir") }
    }

    /// Build a CLI invocation scoped to this fleet's database and artifact root.
    pub fn netcfg(&self) -> CliBuilder {
        let db_path = self.dir.path().join("netcfg.db");
        cli()
            .env("DATABASE_URL", format!("sqlite://{}", db_path.display()))
            .env("NETCFG_ARTIFACT_ROOT", self.dir.path().join("backups").to_string_lossy())
            .env("ENCRYPTION_KEY", "spec-test-key-material-0123456789")
    }
}
