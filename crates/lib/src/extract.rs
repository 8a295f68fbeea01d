//! Archive extraction and source root discovery.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::config::ArchiveFormat;
use crate::error::{Error, Result};
use crate::process::{Invocation, Toolchain};

/// The `tar` invocation unpacking `archive` into `dest`.
pub fn extract_invocation(
  toolchain: &Toolchain,
  format: ArchiveFormat,
  archive: &Path,
  dest: &Path,
  env: &[(String, String)],
) -> Invocation {
  Invocation::new(&toolchain.tar, dest)
    .args(format.tar_flags().iter().copied())
    .args([
      archive.display().to_string(),
      "-C".to_string(),
      dest.display().to_string(),
    ])
    .env(env)
}

/// Find the single top-level directory an archive was extracted to.
///
/// Plain files (such as the archive itself) are ignored. Zero or several
/// directories are both errors: picking one by listing order would make the
/// build depend on the filesystem.
pub async fn locate_source_root(dir: &Path) -> Result<PathBuf> {
  let mut entries = fs::read_dir(dir).await.map_err(Error::fs(dir))?;
  let mut dirs = Vec::new();
  while let Some(entry) = entries.next_entry().await.map_err(Error::fs(dir))? {
    let file_type = entry.file_type().await.map_err(Error::fs(entry.path()))?;
    if file_type.is_dir() {
      dirs.push(entry.path());
    }
  }

  match dirs.len() {
    1 => Ok(dirs.remove(0)),
    found => Err(Error::ExtractionLayout {
      dir: dir.to_path_buf(),
      found,
    }),
  }
}
