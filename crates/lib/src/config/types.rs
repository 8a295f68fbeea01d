use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// The root of a build configuration.
///
/// Packages are shared by every profile: each selected profile builds every
/// package, in the order they are declared.
///
/// Field names are the lowercased keys; [`Config::from_json`] folds the keys
/// of a document to lowercase before deserializing, so `Profiles`,
/// `profiles` and `PROFILES` are the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub struct Config {
  pub profiles: Vec<Profile>,
  pub packages: Vec<Package>,
}

/// A named build variant with its own environment and configure flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub struct Profile {
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub env: BTreeMap<String, String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub configure: Vec<String>,
}

/// A single source package fetched, extracted and built under every profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub struct Package {
  pub name: String,
  /// URL of the source archive.
  pub sources: String,
  /// Explicit archive format; inferred from `sources` when absent.
  #[serde(default, deserialize_with = "deserialize_format")]
  pub format: Option<ArchiveFormat>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub configure: Vec<String>,
  /// Prefixes of profile configure flags this package must not receive.
  #[serde(rename = "configureblacklist", default, deserialize_with = "null_as_default")]
  pub configure_blacklist: Vec<String>,
}

impl Package {
  /// The blacklist predicate derived from `configure_blacklist`.
  pub fn blacklist(&self) -> Blacklist<'_> {
    Blacklist::new(&self.configure_blacklist)
  }

  /// Resolve the archive format of this package.
  ///
  /// An explicit `Format` always wins. Otherwise the source URL is searched
  /// for `.tar.xz`, then `.tar.gz`. Anything else is an error rather than a
  /// silent default.
  pub fn archive_format(&self) -> Result<ArchiveFormat> {
    if let Some(format) = self.format {
      return Ok(format);
    }
    ArchiveFormat::infer(&self.sources).ok_or_else(|| Error::FormatInference {
      package: self.name.clone(),
      url: self.sources.clone(),
    })
  }
}

/// Supported source archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArchiveFormat {
  #[serde(rename = "tar.gz")]
  TarGz,
  #[serde(rename = "tar.xz")]
  TarXz,
}

impl ArchiveFormat {
  /// File name suffix, also the name used in configuration files.
  pub fn extension(self) -> &'static str {
    match self {
      ArchiveFormat::TarGz => "tar.gz",
      ArchiveFormat::TarXz => "tar.xz",
    }
  }

  /// Flags passed to `tar` to unpack this format.
  ///
  /// Modern tar detects compression on its own, so both formats share the
  /// same flags today.
  pub fn tar_flags(self) -> &'static [&'static str] {
    match self {
      ArchiveFormat::TarGz => &["xf"],
      ArchiveFormat::TarXz => &["xf"],
    }
  }

  /// Guess the format from a URL by substring match.
  pub fn infer(url: &str) -> Option<Self> {
    if url.contains(".tar.xz") {
      Some(ArchiveFormat::TarXz)
    } else if url.contains(".tar.gz") {
      Some(ArchiveFormat::TarGz)
    } else {
      None
    }
  }
}

impl fmt::Display for ArchiveFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.extension())
  }
}

impl FromStr for ArchiveFormat {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s {
      "tar.gz" => Ok(ArchiveFormat::TarGz),
      "tar.xz" => Ok(ArchiveFormat::TarXz),
      other => Err(format!("unknown archive format '{}' (expected tar.gz or tar.xz)", other)),
    }
  }
}

/// An explicit `null` means the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de> + Default,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An empty `Format` string means "not specified".
fn deserialize_format<'de, D>(
  deserializer: D,
) -> std::result::Result<Option<ArchiveFormat>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<String>::deserialize(deserializer)?;
  match raw.as_deref() {
    None | Some("") => Ok(None),
    Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
  }
}

/// Prefix predicate over configure arguments.
#[derive(Debug, Clone, Copy)]
pub struct Blacklist<'a> {
  prefixes: &'a [String],
}

impl<'a> Blacklist<'a> {
  pub fn new(prefixes: &'a [String]) -> Self {
    Self { prefixes }
  }

  /// Returns true if `arg` starts with any listed prefix.
  pub fn has(&self, arg: &str) -> bool {
    self.prefixes.iter().any(|p| arg.starts_with(p.as_str()))
  }
}
