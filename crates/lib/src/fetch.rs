//! Source archive download.
//!
//! The pipeline only needs "write the body at this URL to this path and tell
//! me how big it was", which is the [`Fetcher`] trait. [`HttpFetcher`] is the
//! production implementation on top of `reqwest`.

use std::future::Future;
use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Error, Result};

/// Outcome of a successful download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Download {
  pub bytes_written: u64,
  /// Size announced by the server, when it announced one.
  pub content_length: Option<u64>,
}

/// Downloads a URL to a file.
pub trait Fetcher {
  fn fetch(&self, url: &str, dest: &Path) -> impl Future<Output = Result<Download>> + Send;
}

/// HTTP(S) fetcher. The body is streamed to disk chunk by chunk.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("otto/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(Error::HttpClient)?;
    Ok(Self { client })
  }
}

impl Fetcher for HttpFetcher {
  async fn fetch(&self, url: &str, dest: &Path) -> Result<Download> {
    let transfer = |message: String| Error::Transfer {
      url: url.to_string(),
      message,
    };

    let mut response = self.client.get(url).send().await.map_err(|e| transfer(e.to_string()))?;

    if !response.status().is_success() {
      return Err(transfer(format!("HTTP {}", response.status())));
    }

    let content_length = response.content_length().filter(|&len| len > 0);
    debug!(url, dest = %dest.display(), content_length, "receiving body");

    let mut file = fs::File::create(dest).await.map_err(Error::fs(dest))?;
    let mut bytes_written = 0u64;
    while let Some(chunk) = response.chunk().await.map_err(|e| transfer(e.to_string()))? {
      file.write_all(&chunk).await.map_err(Error::fs(dest))?;
      bytes_written += chunk.len() as u64;
    }
    file.flush().await.map_err(Error::fs(dest))?;

    Ok(Download {
      bytes_written,
      content_length,
    })
  }
}

/// Human readable size in IEC units, e.g. `1.5 KiB`.
pub fn format_bytes(bytes: u64) -> String {
  const KIB: u64 = 1024;
  const MIB: u64 = KIB * 1024;
  const GIB: u64 = MIB * 1024;

  if bytes >= GIB {
    format!("{:.1} GiB", bytes as f64 / GIB as f64)
  } else if bytes >= MIB {
    format!("{:.1} MiB", bytes as f64 / MIB as f64)
  } else if bytes >= KIB {
    format!("{:.1} KiB", bytes as f64 / KIB as f64)
  } else {
    format!("{} B", bytes)
  }
}

/// The announced size for logging, or `? bytes` when the server did not say.
pub fn describe_size(content_length: Option<u64>) -> String {
  match content_length {
    Some(len) => format_bytes(len),
    None => "? bytes".to_string(),
  }
}
