// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Resource locations for the crop CSV and the boundary document.
//!
//! Both inputs may live on disk or behind an HTTP(S) URL. Reads are async and
//! never cached; every call goes back to the source.

use std::fmt;
use std::path::PathBuf;

use log::debug;
use thiserror::Error;

/// Errors that can occur while reading a resource.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a resource is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocation {
    /// An `http://` or `https://` URL.
    Remote(String),
    /// A filesystem path, optionally written as a `file://` URL.
    Local(PathBuf),
}

impl ResourceLocation {
    /// Classify a user-supplied location string.
    #[must_use]
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Remote(trimmed.to_string())
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            Self::Local(PathBuf::from(path))
        } else {
            Self::Local(PathBuf::from(trimmed))
        }
    }

    /// Read the whole resource into memory.
    ///
    /// Non-success HTTP statuses are reported as [`FetchError::Status`] rather
    /// than handing an error page to the caller's parser.
    pub async fn read(&self, client: &reqwest::Client) -> Result<Vec<u8>, FetchError> {
        match self {
            Self::Remote(url) => {
                debug!("GET {url}");
                let response = client.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }
                Ok(response.bytes().await?.to_vec())
            }
            Self::Local(path) => {
                debug!("Reading {}", path.display());
                Ok(tokio::fs::read(path).await?)
            }
        }
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => f.write_str(url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}
