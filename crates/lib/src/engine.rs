//! Orchestration of a whole build run.
//!
//! Profiles are visited in declared order, and within each profile every
//! package in declared order. Everything is sequential and the first error
//! ends the run.
//!
//! # Resume
//!
//! With a resume package name, each profile starts in "skipping" mode and
//! leaves it at the first package with that name, which is built again. A
//! name that matches nothing therefore skips every package. Nothing is
//! recorded on disk; the operator passes the name on the next invocation.

use std::num::NonZeroU32;
use std::path::PathBuf;

use tokio::fs;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::layout::Layout;
use crate::pipeline::{PackageReport, Pipeline};
use crate::process::{Runner, Toolchain};

/// Default `make -jN` level.
pub const DEFAULT_JOBS: NonZeroU32 = NonZeroU32::new(2).unwrap();

/// Options for one run, fixed before the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
  /// Absolute output directory.
  pub out_dir: PathBuf,
  /// Only build the profile with this name.
  pub profile: Option<String>,
  /// Skip packages until one with this name is reached.
  pub resume: Option<String>,
  pub jobs: NonZeroU32,
  pub toolchain: Toolchain,
  /// Variables of the invoking process passed through to every tool.
  pub inherited_env: Vec<(String, String)>,
}

impl RunOptions {
  pub fn new(out_dir: impl Into<PathBuf>) -> Self {
    Self {
      out_dir: out_dir.into(),
      profile: None,
      resume: None,
      jobs: DEFAULT_JOBS,
      toolchain: Toolchain::default(),
      inherited_env: Vec::new(),
    }
  }

  /// Set the profile filter. An empty name means no filter.
  pub fn with_profile(mut self, profile: Option<String>) -> Self {
    self.profile = profile.filter(|p| !p.is_empty());
    self
  }

  /// Set the resume package. An empty name means no resume.
  pub fn with_resume(mut self, resume: Option<String>) -> Self {
    self.resume = resume.filter(|r| !r.is_empty());
    self
  }

  pub fn with_jobs(mut self, jobs: NonZeroU32) -> Self {
    self.jobs = jobs;
    self
  }

  pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
    self.toolchain = toolchain;
    self
  }

  pub fn with_inherited_env(mut self, env: Vec<(String, String)>) -> Self {
    self.inherited_env = env;
    self
  }
}

/// What a completed run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
  /// Packages built, in build order.
  pub built: Vec<PackageReport>,
  /// `(profile, package)` pairs skipped while resuming.
  pub skipped_packages: Vec<(String, String)>,
  /// Profiles excluded by the profile filter.
  pub skipped_profiles: Vec<String>,
}

/// Drives every selected profile and package through the pipeline.
pub struct Engine<'a, F, R> {
  config: &'a Config,
  options: &'a RunOptions,
  fetcher: &'a F,
  runner: &'a R,
}

impl<'a, F: Fetcher, R: Runner> Engine<'a, F, R> {
  pub fn new(config: &'a Config, options: &'a RunOptions, fetcher: &'a F, runner: &'a R) -> Self {
    Self {
      config,
      options,
      fetcher,
      runner,
    }
  }

  /// Run to completion or to the first error.
  pub async fn run(&self) -> Result<RunSummary> {
    let layout = Layout::new(&self.options.out_dir);
    let pipeline = Pipeline {
      layout: &layout,
      toolchain: &self.options.toolchain,
      jobs: self.options.jobs,
      inherited_env: &self.options.inherited_env,
      fetcher: self.fetcher,
      runner: self.runner,
    };
    let resume = self.options.resume.as_deref();

    if let Some(name) = resume {
      if !self.config.has_package(name) {
        warn!(resume = %name, "resume package matches no package, every package will be skipped");
      }
    }

    let mut summary = RunSummary::default();

    for profile in &self.config.profiles {
      if self.options.profile.as_ref().is_some_and(|only| *only != profile.name) {
        info!(profile = %profile.name, "skipping profile");
        summary.skipped_profiles.push(profile.name.clone());
        continue;
      }

      info!(profile = %profile.name, "dealing with profile");

      let src = layout.profile_src(&profile.name);
      fs::create_dir_all(&src).await.map_err(Error::fs(&src))?;
      let prefix = layout.install_prefix(&profile.name);
      fs::create_dir_all(&prefix).await.map_err(Error::fs(&prefix))?;

      let mut skipping = resume.is_some();

      for package in &self.config.packages {
        if skipping && resume == Some(package.name.as_str()) {
          skipping = false;
        }

        if skipping {
          info!(profile = %profile.name, package = %package.name, "skipping package");
          summary
            .skipped_packages
            .push((profile.name.clone(), package.name.clone()));
          continue;
        }

        let report = pipeline.run(profile, package).await?;
        summary.built.push(report);
      }
    }

    info!(
      built = summary.built.len(),
      skipped = summary.skipped_packages.len(),
      "all done"
    );
    Ok(summary)
  }
}
