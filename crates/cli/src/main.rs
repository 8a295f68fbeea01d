mod cmd;
mod output;

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use otto_lib::DEFAULT_JOBS;
use tracing_subscriber::EnvFilter;

use crate::cmd::BuildArgs;
use crate::output::print_error;

/// otto - build a stack of autotools packages from scratch, once per profile
#[derive(Parser)]
#[command(name = "otto")]
#[command(author, version, about = "An autotools hater", long_about = None)]
struct Cli {
  /// Path to JSON config file
  config: PathBuf,

  /// Output directory (sources under <outdir>/src, prefixes under <outdir>/<profile>)
  outdir: PathBuf,

  /// Only build this profile
  #[arg(long)]
  profile: Option<String>,

  /// Package to resume the build at (it is rebuilt, earlier packages are skipped)
  #[arg(long)]
  resume: Option<String>,

  /// The N in -jN to pass to make
  #[arg(short = 'j', long, default_value_t = DEFAULT_JOBS)]
  concurrency: NonZeroU32,

  /// Program used to unpack archives
  #[arg(long, default_value = "tar")]
  tar: String,

  /// Program used to build and install
  #[arg(long, default_value = "make")]
  make: String,

  /// Environment variable passed through to every tool (repeatable)
  #[arg(long = "inherit-env", value_name = "NAME", default_value = "PATH")]
  inherit_env: Vec<String>,

  /// Pass no variables of this process through to tools
  #[arg(long, conflicts_with = "inherit_env")]
  no_inherit_env: bool,

  /// Log level used when RUST_LOG is not set
  #[arg(long, default_value = "info")]
  log_level: String,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  // Initialize logging
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let inherit_env = if cli.no_inherit_env { Vec::new() } else { cli.inherit_env };
  let args = BuildArgs {
    config: cli.config,
    outdir: cli.outdir,
    profile: cli.profile,
    resume: cli.resume,
    jobs: cli.concurrency,
    tar: cli.tar,
    make: cli.make,
    inherit_env,
  };

  match cmd::cmd_build(args) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
