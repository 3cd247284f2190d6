//! Resource fetching: remote URLs, local paths, and embedded `data:` URLs.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use url::Url;

use crate::error::{Error, Result};

/// Timeout applied to every remote request. A fetch either completes within
/// this window or fails; there are no retries.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Retrieves media sources for the EPUB.
///
/// A source is an `http(s)` URL, a local file path (optionally given as a
/// `file:` URL), or an embedded `data:` URL.
pub struct Fetcher {
    agent: ureq::Agent,
}

enum Source {
    Remote(String),
    Local(PathBuf),
    Data,
}

fn classify(source: &str) -> Source {
    if source.starts_with("data:") {
        return Source::Data;
    }
    if let Ok(url) = Url::parse(source) {
        match url.scheme() {
            "http" | "https" => return Source::Remote(source.to_string()),
            "file" => {
                if let Ok(path) = url.to_file_path() {
                    return Source::Local(path);
                }
            }
            _ => {}
        }
    }
    Source::Local(PathBuf::from(source))
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(FETCH_TIMEOUT))
            .build();
        Fetcher {
            agent: config.into(),
        }
    }

    /// Check that a source is retrievable without materializing its bytes.
    ///
    /// Remote sources are probed with a HEAD request; local sources with a
    /// metadata lookup; `data:` URLs by decoding the payload.
    pub fn check(&self, source: &str) -> Result<()> {
        match classify(source) {
            Source::Data => decode_data_url(source).map(|_| ()),
            Source::Local(path) => match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => Ok(()),
                Ok(_) => Err(retrieval(source, "not a regular file")),
                Err(e) => Err(retrieval(source, e)),
            },
            Source::Remote(url) => match self.agent.head(&url).call() {
                Ok(_) => Ok(()),
                Err(e) => Err(retrieval(source, e)),
            },
        }
    }

    /// Materialize a source into bytes.
    pub fn retrieve(&self, source: &str) -> Result<Vec<u8>> {
        match classify(source) {
            Source::Data => decode_data_url(source),
            Source::Local(path) => fs::read(&path).map_err(|e| retrieval(source, e)),
            Source::Remote(url) => {
                let mut response = self
                    .agent
                    .get(&url)
                    .call()
                    .map_err(|e| retrieval(source, e))?;
                response
                    .body_mut()
                    .read_to_vec()
                    .map_err(|e| retrieval(source, e))
            }
        }
    }

    /// Probe the `Content-Type` of a remote source without fetching the body.
    pub fn content_type(&self, url: &str) -> Option<String> {
        let response = self.agent.head(url).call().ok()?;
        response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string())
    }
}

/// Encode bytes as a base64 `data:` URL.
pub fn encode_data_url(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{media_type};base64,{}", BASE64.encode(bytes))
}

/// Decode the payload of a `data:` URL.
fn decode_data_url(source: &str) -> Result<Vec<u8>> {
    let rest = source
        .strip_prefix("data:")
        .ok_or_else(|| retrieval(source, "not a data: URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| retrieval(source, "data: URL has no payload"))?;

    if header
        .split(';')
        .any(|segment| segment.trim().eq_ignore_ascii_case("base64"))
    {
        BASE64.decode(payload).map_err(|e| retrieval(source, e))
    } else {
        // Textual payload, percent-encoded.
        Ok(percent_encoding::percent_decode_str(payload).collect())
    }
}

fn retrieval(source: &str, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Error {
    Error::Retrieval {
        source: source.to_string(),
        cause: cause.into(),
    }
}
