//! Error types for otto-lib.
//!
//! Every error is fatal to a run. The engine stops at the first one and the
//! caller decides how to report it; recovery is a manual re-run with
//! `--resume`.

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::Stage;
use crate::process::RunError;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can abort a build run.
#[derive(Debug, Error)]
pub enum Error {
  /// The configuration file could not be read.
  #[error("failed to read config '{path}'")]
  ConfigRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The configuration file is not valid JSON for the model.
  #[error("failed to parse config '{path}'")]
  ConfigParse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  /// The configuration parsed but violates a validation rule.
  #[error("invalid config: {0}")]
  ConfigInvalid(String),

  /// A directory or file could not be created or written.
  #[error("filesystem error at '{path}'")]
  Filesystem {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Neither an explicit format nor a recognizable URL suffix was given.
  #[error("could not figure out archive format of '{url}' for package '{package}', please specify Format explicitly")]
  FormatInference { package: String, url: String },

  /// The HTTP client could not be set up.
  #[error("failed to build HTTP client")]
  HttpClient(#[source] reqwest::Error),

  /// The download failed or the server answered with a non-success status.
  #[error("transfer failed for {url}: {message}")]
  Transfer { url: String, message: String },

  /// The extracted archive did not contain exactly one top-level directory.
  #[error("expected exactly one top-level directory in '{dir}', found {found}")]
  ExtractionLayout { dir: PathBuf, found: usize },

  /// An external tool could not be spawned or exited unsuccessfully.
  #[error(transparent)]
  Subprocess(#[from] RunError),

  /// A package pipeline failed at the given stage.
  #[error("package '{package}' (profile '{profile}') failed while {stage}")]
  Package {
    profile: String,
    package: String,
    stage: Stage,
    #[source]
    source: Box<Error>,
  },
}

impl Error {
  /// Wrap an io error for `path` as a filesystem error.
  pub(crate) fn fs(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
    let path = path.into();
    move |source| Error::Filesystem { path, source }
  }
}
