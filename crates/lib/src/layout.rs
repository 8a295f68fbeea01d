//! Filesystem layout of a build output directory.
//!
//! ```text
//! <out>/src/<profile>/<package>/<package>.<format>   downloaded archive
//! <out>/src/<profile>/<package>/<top-level dir>/     extracted source root
//! <out>/<profile>/                                   install prefix
//! ```

use std::path::PathBuf;

use crate::config::ArchiveFormat;

/// Path computations rooted at an absolute output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
  out_dir: PathBuf,
}

impl Layout {
  /// `out_dir` must be absolute: every path derived from it ends up in a
  /// child's command line or environment, where the working directory differs.
  pub fn new(out_dir: impl Into<PathBuf>) -> Self {
    let out_dir = out_dir.into();
    debug_assert!(
      out_dir.is_absolute(),
      "output directory must be absolute: {}",
      out_dir.display()
    );
    Self { out_dir }
  }

  /// Directory holding every package source tree of a profile.
  pub fn profile_src(&self, profile: &str) -> PathBuf {
    self.out_dir.join("src").join(profile)
  }

  /// Install prefix handed to `configure --prefix`.
  pub fn install_prefix(&self, profile: &str) -> PathBuf {
    self.out_dir.join(profile)
  }

  pub fn package_src(&self, profile: &str, package: &str) -> PathBuf {
    self.profile_src(profile).join(package)
  }

  pub fn archive_path(&self, profile: &str, package: &str, format: ArchiveFormat) -> PathBuf {
    self
      .package_src(profile, package)
      .join(format!("{}.{}", package, format.extension()))
  }
}
