//! Build configuration.
//!
//! A configuration is a JSON document with two ordered lists: `Profiles`
//! (build variants) and `Packages` (source packages built under every
//! profile). It is loaded once and never mutated during a run.

mod types;

pub use types::*;

use std::collections::HashSet;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};

impl Config {
  /// Read, parse and validate a configuration file.
  pub fn from_file(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
      path: path.to_path_buf(),
      source,
    })?;
    let config = Self::from_json(&content).map_err(|source| Error::ConfigParse {
      path: path.to_path_buf(),
      source,
    })?;
    config.validate()?;

    debug!(
      path = %path.display(),
      profiles = config.profiles.len(),
      packages = config.packages.len(),
      "loaded config"
    );
    Ok(config)
  }

  /// Parse a JSON document, matching keys case-insensitively.
  ///
  /// Keys of the root object and of every profile and package are folded to
  /// lowercase. Profile `Env` maps are left alone: variable names are case
  /// sensitive.
  pub fn from_json(content: &str) -> serde_json::Result<Self> {
    let mut document: Value = serde_json::from_str(content)?;
    fold_keys(&mut document);
    if let Value::Object(root) = &mut document {
      for list in ["profiles", "packages"] {
        if let Some(Value::Array(items)) = root.get_mut(list) {
          items.iter_mut().for_each(fold_keys);
        }
      }
    }
    serde_json::from_value(document)
  }

  /// Check the rules the JSON schema cannot express.
  ///
  /// Names must be non-empty and unique within their list. Package names
  /// become directory names, so they must also be a single path component.
  pub fn validate(&self) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, profile) in self.profiles.iter().enumerate() {
      if profile.name.is_empty() {
        return Err(Error::ConfigInvalid(format!("profile #{} has an empty name", index)));
      }
      check_path_component("profile", &profile.name)?;
      if !seen.insert(profile.name.as_str()) {
        return Err(Error::ConfigInvalid(format!("duplicate profile name '{}'", profile.name)));
      }
    }

    let mut seen = HashSet::new();
    for (index, package) in self.packages.iter().enumerate() {
      if package.name.is_empty() {
        return Err(Error::ConfigInvalid(format!("package #{} has an empty name", index)));
      }
      check_path_component("package", &package.name)?;
      if !seen.insert(package.name.as_str()) {
        return Err(Error::ConfigInvalid(format!("duplicate package name '{}'", package.name)));
      }
      if package.sources.is_empty() {
        return Err(Error::ConfigInvalid(format!("package '{}' has no Sources URL", package.name)));
      }
    }

    Ok(())
  }

  /// Returns true if some package is named `name`.
  pub fn has_package(&self, name: &str) -> bool {
    self.packages.iter().any(|p| p.name == name)
  }
}

/// Lowercase the keys of a JSON object, one level deep.
fn fold_keys(value: &mut Value) {
  if let Value::Object(map) = value {
    let folded: Map<String, Value> = std::mem::take(map)
      .into_iter()
      .map(|(key, value)| (key.to_lowercase(), value))
      .collect();
    *map = folded;
  }
}

fn check_path_component(kind: &str, name: &str) -> Result<()> {
  if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
    return Err(Error::ConfigInvalid(format!(
      "{} name '{}' must be a plain directory name",
      kind, name
    )));
  }
  Ok(())
}
