//! Per-package build pipeline.
//!
//! One package under one profile goes through
//! `Preparing -> Downloading -> Extracting -> Locating -> Configuring ->
//! Building -> Installing -> Done`. The first failing stage ends the
//! pipeline; the error records which stage it was.
//!
//! Tools are run with an explicit working directory, so nothing here
//! changes the working directory of the process.

use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;

use tokio::fs;
use tracing::info;

use crate::compose;
use crate::config::{Package, Profile};
use crate::error::{Error, Result};
use crate::extract::{extract_invocation, locate_source_root};
use crate::fetch::{Fetcher, describe_size, format_bytes};
use crate::layout::Layout;
use crate::process::{Invocation, Runner, Toolchain};

/// Pipeline states, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
  Preparing,
  Downloading,
  Extracting,
  Locating,
  Configuring,
  Building,
  Installing,
  Done,
}

impl Stage {
  pub fn as_str(self) -> &'static str {
    match self {
      Stage::Preparing => "preparing",
      Stage::Downloading => "downloading",
      Stage::Extracting => "extracting",
      Stage::Locating => "locating",
      Stage::Configuring => "configuring",
      Stage::Building => "building",
      Stage::Installing => "installing",
      Stage::Done => "done",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// What a successful pipeline produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
  pub profile: String,
  pub package: String,
  pub archive: PathBuf,
  pub source_root: PathBuf,
}

/// Everything a package build needs besides the profile and package.
pub struct Pipeline<'a, F, R> {
  pub layout: &'a Layout,
  pub toolchain: &'a Toolchain,
  pub jobs: NonZeroU32,
  /// Variables passed through from the invoking process.
  pub inherited_env: &'a [(String, String)],
  pub fetcher: &'a F,
  pub runner: &'a R,
}

impl<F: Fetcher, R: Runner> Pipeline<'_, F, R> {
  /// Build and install `package` into `profile`'s prefix.
  pub async fn run(&self, profile: &Profile, package: &Package) -> Result<PackageReport> {
    let mut stage = Stage::Preparing;
    match self.run_stages(profile, package, &mut stage).await {
      Ok(report) => Ok(report),
      Err(source) => Err(Error::Package {
        profile: profile.name.clone(),
        package: package.name.clone(),
        stage,
        source: Box::new(source),
      }),
    }
  }

  async fn run_stages(
    &self,
    profile: &Profile,
    package: &Package,
    stage: &mut Stage,
  ) -> Result<PackageReport> {
    let enter = |stage: &mut Stage, next: Stage| {
      *stage = next;
      info!(profile = %profile.name, package = %package.name, "{}", next);
    };

    enter(stage, Stage::Preparing);
    let prefix = self.layout.install_prefix(&profile.name);
    let package_src = self.layout.package_src(&profile.name, &package.name);
    fs::create_dir_all(&package_src).await.map_err(Error::fs(&package_src))?;
    let env = compose::environment(&prefix, profile, self.inherited_env);

    enter(stage, Stage::Downloading);
    let format = package.archive_format()?;
    let archive = self.layout.archive_path(&profile.name, &package.name, format);
    info!(url = %package.sources, dest = %archive.display(), "downloading");
    let download = self.fetcher.fetch(&package.sources, &archive).await?;
    info!(
      size = %describe_size(download.content_length),
      written = %format_bytes(download.bytes_written),
      "downloaded"
    );

    enter(stage, Stage::Extracting);
    let extract = extract_invocation(self.toolchain, format, &archive, &package_src, &env);
    self.runner.run(&extract).await?;

    enter(stage, Stage::Locating);
    let source_root = locate_source_root(&package_src).await?;
    info!(source_root = %source_root.display(), "found source root");

    enter(stage, Stage::Configuring);
    let script = source_root.join("configure").display().to_string();
    let configure = Invocation::new(script, &source_root)
      .args(compose::configure_args(&prefix, profile, package))
      .env(&env);
    self.runner.run(&configure).await?;

    enter(stage, Stage::Building);
    let build = Invocation::new(&self.toolchain.make, &source_root)
      .args([compose::make_jobs_flag(self.jobs)])
      .env(&env);
    self.runner.run(&build).await?;

    enter(stage, Stage::Installing);
    let install = Invocation::new(&self.toolchain.make, &source_root)
      .args(["install"])
      .env(&env);
    self.runner.run(&install).await?;

    enter(stage, Stage::Done);
    Ok(PackageReport {
      profile: profile.name.clone(),
      package: package.name.clone(),
      archive,
      source_root,
    })
  }
}
