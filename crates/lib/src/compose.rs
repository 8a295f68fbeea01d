//! Composition of per-package configure arguments and child environments.

use std::num::NonZeroU32;
use std::path::Path;

use tracing::warn;

use crate::config::{Package, Profile};

/// Name of the variable that always carries the install prefix.
pub const PREFIX_VAR: &str = "PREFIX";

/// Build the `./configure` argument vector for one package under one profile.
///
/// The result is `--prefix=<prefix>`, then the profile's flags that the
/// package does not blacklist, then all of the package's own flags. The
/// package blacklist never filters the package's own flags.
pub fn configure_args(prefix: &Path, profile: &Profile, package: &Package) -> Vec<String> {
  let blacklist = package.blacklist();

  let mut args = Vec::with_capacity(1 + profile.configure.len() + package.configure.len());
  args.push(format!("--prefix={}", prefix.display()));
  args.extend(profile.configure.iter().filter(|arg| !blacklist.has(arg)).cloned());
  args.extend(package.configure.iter().cloned());
  args
}

/// Build the complete child environment for one profile.
///
/// Order is: `inherited` pass-through variables, then the profile's `Env`
/// entries, then `PREFIX`. Any other `PREFIX` entry is dropped so the
/// computed prefix is the only one.
pub fn environment(prefix: &Path, profile: &Profile, inherited: &[(String, String)]) -> Vec<(String, String)> {
  let mut env = Vec::with_capacity(inherited.len() + profile.env.len() + 1);

  let inherited = inherited.iter().map(|(k, v)| (k, v));
  for (key, value) in inherited.chain(profile.env.iter()) {
    if key == PREFIX_VAR {
      warn!(profile = %profile.name, value = %value, "ignoring PREFIX from environment, it is always the install prefix");
      continue;
    }
    env.push((key.clone(), value.clone()));
  }

  env.push((PREFIX_VAR.to_string(), prefix.display().to_string()));
  env
}

/// Snapshot the named variables of the current process, skipping unset ones.
pub fn inherit_from_process(names: &[String]) -> Vec<(String, String)> {
  names
    .iter()
    .filter_map(|name| std::env::var(name).ok().map(|value| (name.clone(), value)))
    .collect()
}

/// The `-jN` flag passed to `make`.
pub fn make_jobs_flag(jobs: NonZeroU32) -> String {
  format!("-j{}", jobs)
}
