//! External process execution.
//!
//! Every tool (`tar`, `configure`, `make`) is run through the [`Runner`]
//! trait with an explicit argument vector, an explicit environment and an
//! explicit working directory. The invoking process's environment is never
//! inherited implicitly and its working directory is never changed.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Errors from running an external tool.
#[derive(Debug, Error)]
pub enum RunError {
  /// The program could not be started at all.
  #[error("failed to spawn '{cmd}'")]
  Spawn {
    cmd: String,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  Failed { cmd: String, code: Option<i32> },
}

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<String>,
  /// Complete child environment, applied in order (later entries win).
  pub env: Vec<(String, String)>,
  pub cwd: PathBuf,
}

impl Invocation {
  pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      env: Vec::new(),
      cwd: cwd.into(),
    }
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, env: &[(String, String)]) -> Self {
    self.env = env.to_vec();
    self
  }

  /// `program arg1 arg2 ...`, for logs and error messages.
  pub fn command_line(&self) -> String {
    let mut line = self.program.clone();
    for arg in &self.args {
      line.push(' ');
      line.push_str(arg);
    }
    line
  }
}

/// Executes [`Invocation`]s.
pub trait Runner {
  /// Run to completion. Success means a zero exit status.
  fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<(), RunError>> + Send;
}

/// Runs commands as real child processes with stdout and stderr streamed
/// straight through to this process's own streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner;

impl Runner for CommandRunner {
  async fn run(&self, invocation: &Invocation) -> Result<(), RunError> {
    let cmd = invocation.command_line();
    info!("> {}", cmd);
    debug!(
      cwd = %invocation.cwd.display(),
      env = %render_env(&invocation.env),
      "spawning process"
    );

    let status = Command::new(&invocation.program)
      .args(&invocation.args)
      .env_clear()
      .envs(invocation.env.iter().map(|(k, v)| (k, v)))
      .current_dir(&invocation.cwd)
      .stdin(Stdio::null())
      .stdout(Stdio::inherit())
      .stderr(Stdio::inherit())
      .status()
      .await
      .map_err(|source| RunError::Spawn {
        cmd: cmd.clone(),
        source,
      })?;

    if !status.success() {
      return Err(RunError::Failed {
        cmd,
        code: status.code(),
      });
    }

    Ok(())
  }
}

fn render_env(env: &[(String, String)]) -> String {
  env
    .iter()
    .map(|(k, v)| format!("{}={}", k, v))
    .collect::<Vec<_>>()
    .join(" ")
}

/// Names of the external tools used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
  pub tar: String,
  pub make: String,
}

impl Default for Toolchain {
  fn default() -> Self {
    Self {
      tar: "tar".to_string(),
      make: "make".to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::shell_cmd;
  use tempfile::TempDir;

  fn shell(script: &str, cwd: &std::path::Path) -> Invocation {
    let (program, args) = shell_cmd(script);
    Invocation::new(program, cwd).args(args)
  }

  #[test]
  fn command_line_joins_args() {
    let invocation = Invocation::new("make", "/tmp").args(["-j2"]);
    assert_eq!(invocation.command_line(), "make -j2");
    assert_eq!(Invocation::new("make", "/tmp").command_line(), "make");
  }

  #[test]
  fn render_env_keeps_order() {
    let env = vec![
      ("B".to_string(), "2".to_string()),
      ("A".to_string(), "1".to_string()),
    ];
    assert_eq!(render_env(&env), "B=2 A=1");
  }

  #[test]
  fn toolchain_defaults() {
    let toolchain = Toolchain::default();
    assert_eq!(toolchain.tar, "tar");
    assert_eq!(toolchain.make, "make");
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn run_success() {
    let temp = TempDir::new().unwrap();
    CommandRunner.run(&shell("exit 0", temp.path())).await.unwrap();
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn run_reports_exit_code() {
    let temp = TempDir::new().unwrap();
    let err = CommandRunner.run(&shell("exit 3", temp.path())).await.unwrap_err();
    assert!(matches!(err, RunError::Failed { code: Some(3), .. }));
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn run_uses_only_explicit_env() {
    let temp = TempDir::new().unwrap();
    let env = vec![("FOO".to_string(), "bar".to_string())];
    let invocation = shell(r#"test -z "$HOME" && test "$FOO" = bar"#, temp.path()).env(&env);

    CommandRunner.run(&invocation).await.unwrap();
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn run_later_env_entries_win() {
    let temp = TempDir::new().unwrap();
    let env = vec![
      ("PREFIX".to_string(), "/wrong".to_string()),
      ("PREFIX".to_string(), "/right".to_string()),
    ];
    let invocation = shell(r#"test "$PREFIX" = /right"#, temp.path()).env(&env);

    CommandRunner.run(&invocation).await.unwrap();
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn run_in_working_directory() {
    let temp = TempDir::new().unwrap();
    let sub_dir = temp.path().join("subdir");
    std::fs::create_dir(&sub_dir).unwrap();

    CommandRunner.run(&shell(": > cwd_marker", &sub_dir)).await.unwrap();

    assert!(sub_dir.join("cwd_marker").exists());
  }

  #[tokio::test]
  async fn run_missing_program() {
    let temp = TempDir::new().unwrap();
    let invocation = Invocation::new("/nonexistent/otto-test-program", temp.path());
    let err = CommandRunner.run(&invocation).await.unwrap_err();
    assert!(matches!(err, RunError::Spawn { .. }));
  }
}
