//! Brand font bytes, fetched once per process.
//!
//! The compositor accepts an optional font part per render call; the bytes
//! come from a local file or an HTTP location configured at startup. The
//! first caller performs the fetch while concurrent callers wait on the same
//! cell, and the result — including a failed fetch — is memoized for the
//! process lifetime. A missing font degrades rendering to the compositor's
//! default typeface instead of failing requests.

use std::path::PathBuf;

use bytes::Bytes;
use thiserror::Error;
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone)]
pub enum FontLocation {
    File(PathBuf),
    Remote(Url),
}

#[derive(Debug, Error)]
enum FontError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("font host returned status {status}")]
    Upstream { status: u16 },
}

pub struct FontSource {
    location: Option<FontLocation>,
    http: reqwest::Client,
    cell: OnceCell<Option<Bytes>>,
}

impl FontSource {
    pub fn new(location: Option<FontLocation>, http: reqwest::Client) -> Self {
        Self {
            location,
            http,
            cell: OnceCell::new(),
        }
    }

    /// The memoized font bytes, or `None` when no font is configured or the
    /// single fetch attempt failed.
    pub async fn load(&self) -> Option<Bytes> {
        self.cell
            .get_or_init(|| async {
                let location = self.location.as_ref()?;
                match self.fetch(location).await {
                    Ok(bytes) => {
                        info!(
                            target = "cartolina::fonts",
                            size_bytes = bytes.len(),
                            "brand font loaded"
                        );
                        Some(bytes)
                    }
                    Err(err) => {
                        warn!(
                            target = "cartolina::fonts",
                            error = %err,
                            "brand font unavailable, rendering with compositor defaults"
                        );
                        None
                    }
                }
            })
            .await
            .clone()
    }

    async fn fetch(&self, location: &FontLocation) -> Result<Bytes, FontError> {
        match location {
            FontLocation::File(path) => Ok(Bytes::from(fs::read(path).await?)),
            FontLocation::Remote(url) => {
                let response = self.http.get(url.clone()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FontError::Upstream {
                        status: status.as_u16(),
                    });
                }
                Ok(response.bytes().await?)
            }
        }
    }
}
