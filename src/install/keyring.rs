// src/install/keyring.rs

//! Vendor signing key retrieval
//!
//! The vendor publishes its repository key ASCII-armored; the package
//! manager wants the binary form in its keyring directory. Armor is removed
//! here instead of shelling out to gpg.

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::blocking::Client;
#[cfg(any(test, feature = "testing"))]
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const ARMOR_BEGIN: &str = "-----BEGIN PGP";
const ARMOR_END: &str = "-----END PGP";

/// Source of remote bytes
pub trait Downloader {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTPS downloader backed by reqwest
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Download(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Downloader for HttpDownloader {
    /// No retries: a failed fetch is reported once
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::Download(format!("Failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| Error::Download(format!("Failed to read response: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(any(test, feature = "testing"))]
/// Downloader serving fixed bodies by URL
#[derive(Debug, Clone, Default)]
pub struct StaticDownloader {
    bodies: HashMap<String, Vec<u8>>,
}

#[cfg(any(test, feature = "testing"))]
impl StaticDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }
}

#[cfg(any(test, feature = "testing"))]
impl Downloader for StaticDownloader {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Download(format!("HTTP 404 from {}", url)))
    }
}

/// Strip OpenPGP ASCII armor, returning binary key material
///
/// Input that is not armored is returned unchanged.
pub fn dearmor(data: &[u8]) -> Result<Vec<u8>> {
    let text = match std::str::from_utf8(data) {
        Ok(text) if text.trim_start().starts_with(ARMOR_BEGIN) => text,
        _ => return Ok(data.to_vec()),
    };

    let mut lines = text.lines().map(str::trim).skip_while(|l| !l.starts_with(ARMOR_BEGIN));
    lines.next();

    let mut lines = lines.peekable();
    // Armor headers ("Version: ...") end at the first blank line
    while let Some(line) = lines.peek() {
        if line.is_empty() {
            lines.next();
            break;
        }
        if line.contains(": ") {
            lines.next();
        } else {
            break;
        }
    }

    let mut body = String::new();
    let mut terminated = false;
    for line in lines {
        if line.starts_with(ARMOR_END) {
            terminated = true;
            break;
        }
        // CRC24 checksum line
        if line.starts_with('=') {
            continue;
        }
        body.push_str(line);
    }

    if !terminated {
        return Err(Error::Download("Armored key has no END line".to_string()));
    }

    BASE64
        .decode(body.as_bytes())
        .map_err(|e| Error::Download(format!("Armored key is not valid base64: {}", e)))
}
