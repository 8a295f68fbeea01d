//! Test utilities for otto-lib.
//!
//! Cross-platform shell helpers plus in-memory [`Fetcher`] and [`Runner`]
//! fakes that record what the pipeline asked for.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::fetch::{Download, Fetcher};
use crate::process::{Invocation, RunError, Runner};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Fetcher writing a fixed body instead of touching the network.
pub struct FakeFetcher {
  pub body: &'static [u8],
  pub content_length: Option<u64>,
  /// URLs containing this substring fail with a transfer error.
  pub fail_on: Option<&'static str>,
  pub fetched: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeFetcher {
  pub fn new() -> Self {
    Self {
      body: b"not really a tarball",
      content_length: Some(20),
      fail_on: None,
      fetched: Mutex::new(Vec::new()),
    }
  }

  pub fn fetched(&self) -> Vec<(String, PathBuf)> {
    self.fetched.lock().unwrap().clone()
  }
}

impl Fetcher for FakeFetcher {
  async fn fetch(&self, url: &str, dest: &Path) -> Result<Download> {
    self.fetched.lock().unwrap().push((url.to_string(), dest.to_path_buf()));

    if self.fail_on.is_some_and(|needle| url.contains(needle)) {
      return Err(Error::Transfer {
        url: url.to_string(),
        message: "HTTP 404 Not Found".to_string(),
      });
    }

    std::fs::write(dest, self.body).map_err(Error::fs(dest))?;
    Ok(Download {
      bytes_written: self.body.len() as u64,
      content_length: self.content_length,
    })
  }
}

/// Runner recording invocations. `tar` invocations create the configured
/// top-level directories under their `-C` target to mimic extraction.
pub struct FakeRunner {
  pub extract_dirs: Vec<&'static str>,
  /// Invocations whose command line contains this substring fail.
  pub fail_on: Option<&'static str>,
  pub invocations: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
  pub fn new() -> Self {
    Self::extracting(&["source-1.0"])
  }

  pub fn extracting(dirs: &[&'static str]) -> Self {
    Self {
      extract_dirs: dirs.to_vec(),
      fail_on: None,
      invocations: Mutex::new(Vec::new()),
    }
  }

  pub fn invocations(&self) -> Vec<Invocation> {
    self.invocations.lock().unwrap().clone()
  }

  /// Command lines of every invocation, in order.
  pub fn command_lines(&self) -> Vec<String> {
    self.invocations().iter().map(Invocation::command_line).collect()
  }
}

impl Runner for FakeRunner {
  async fn run(&self, invocation: &Invocation) -> std::result::Result<(), RunError> {
    self.invocations.lock().unwrap().push(invocation.clone());
    let cmd = invocation.command_line();

    if self.fail_on.is_some_and(|needle| cmd.contains(needle)) {
      return Err(RunError::Failed { cmd, code: Some(2) });
    }

    if invocation.program == "tar" {
      let dest = invocation
        .args
        .iter()
        .position(|arg| arg == "-C")
        .and_then(|i| invocation.args.get(i + 1))
        .map(PathBuf::from)
        .unwrap_or_else(|| invocation.cwd.clone());
      for dir in &self.extract_dirs {
        std::fs::create_dir_all(dest.join(dir)).unwrap();
      }
    }

    Ok(())
  }
}
