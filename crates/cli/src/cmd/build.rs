//! Implementation of the build run.
//!
//! Loads the configuration, resolves the output directory and the
//! pass-through environment, then drives the engine to completion on a
//! single-threaded runtime.

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::debug;

use otto_lib::compose::inherit_from_process;
use otto_lib::{CommandRunner, Config, Engine, HttpFetcher, RunOptions, Toolchain};

use crate::output::{print_stat, print_success};

/// Parsed command line, already validated by clap.
#[derive(Debug)]
pub struct BuildArgs {
  pub config: PathBuf,
  pub outdir: PathBuf,
  pub profile: Option<String>,
  pub resume: Option<String>,
  pub jobs: NonZeroU32,
  pub tar: String,
  pub make: String,
  pub inherit_env: Vec<String>,
}

/// Build every selected profile and package.
///
/// Any error aborts the run; the operator fixes the cause and re-runs with
/// `--resume <package>`.
pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let started = Instant::now();

  let config = Config::from_file(&args.config)?;
  debug!(?config, "config");

  let out_dir = std::path::absolute(&args.outdir)
    .with_context(|| format!("Failed to resolve output directory {}", args.outdir.display()))?;

  let options = RunOptions::new(out_dir)
    .with_profile(args.profile)
    .with_resume(args.resume)
    .with_jobs(args.jobs)
    .with_toolchain(Toolchain {
      tar: args.tar,
      make: args.make,
    })
    .with_inherited_env(inherit_from_process(&args.inherit_env));

  let fetcher = HttpFetcher::new()?;
  let runner = CommandRunner;

  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")?;
  let summary = rt.block_on(Engine::new(&config, &options, &fetcher, &runner).run())?;

  print_success("All done!");
  print_stat("Packages built", &summary.built.len().to_string());
  if !summary.skipped_packages.is_empty() {
    print_stat("Packages skipped", &summary.skipped_packages.len().to_string());
  }
  if !summary.skipped_profiles.is_empty() {
    print_stat("Profiles skipped", &summary.skipped_profiles.join(", "));
  }
  let elapsed = Duration::from_secs(started.elapsed().as_secs());
  print_stat("Elapsed", &humantime::format_duration(elapsed).to_string());

  Ok(())
}
