//! otto-lib: build a stack of autotools packages from scratch.
//!
//! This crate provides:
//! - `Config`: profiles (build variants) and packages, loaded from JSON
//! - `Engine`: walks every selected profile and package in order, with resume
//! - `Pipeline`: fetch, extract, configure, build and install one package
//! - `Fetcher` / `Runner`: the seams to the network and to external tools

pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod layout;
pub mod pipeline;
pub mod process;

#[cfg(test)]
mod util;

pub use config::{ArchiveFormat, Blacklist, Config, Package, Profile};
pub use engine::{DEFAULT_JOBS, Engine, RunOptions, RunSummary};
pub use error::{Error, Result};
pub use fetch::{Download, Fetcher, HttpFetcher};
pub use pipeline::{PackageReport, Pipeline, Stage};
pub use process::{CommandRunner, Invocation, RunError, Runner, Toolchain};
