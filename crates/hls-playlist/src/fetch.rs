//! Transport collaborators: web download and playlist files
//!
//! The engine never talks to the network directly. Downloads go through a
//! [`Fetcher`], which either fully succeeds or fails. Settings such as
//! timeouts or proxies live in [`FetchConfig`] and are passed through
//! untouched.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, instrument};
use url::Url;

/// Transport settings, interpreted by the fetcher only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in milliseconds, zero for none
    pub timeout_ms: u64,
    /// User agent header
    pub user_agent: Option<String>,
    /// Additional request headers
    pub headers: HashMap<String, String>,
    /// Proxy URL for all requests
    pub proxy: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            user_agent: None,
            headers: HashMap::new(),
            proxy: None,
        }
    }
}

/// Result of a successful download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Body of the response
    pub text: String,
    /// URL after redirections
    pub final_url: Url,
    /// Content type without parameters, empty if not provided
    pub mime_type: String,
}

/// Blocking text download
pub trait Fetcher {
    fn download_text(&self, url: &Url, config: &FetchConfig) -> Result<Download>;
}

/// HTTP(S) fetcher based on the blocking reqwest client
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher;

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new() -> Self {
        Self
    }

    fn client(&self, url: &Url, config: &FetchConfig) -> Result<reqwest::blocking::Client> {
        use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::Download {
                url: url.to_string(),
                reason: format!("invalid header name {}: {}", name, e),
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| Error::Download {
                url: url.to_string(),
                reason: format!("invalid header value {}: {}", value, e),
            })?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::blocking::Client::builder().default_headers(headers);
        if config.timeout_ms > 0 {
            builder = builder.timeout(std::time::Duration::from_millis(config.timeout_ms));
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }
        Ok(builder.build()?)
    }
}

#[cfg(feature = "http")]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self, config))]
    fn download_text(&self, url: &Url, config: &FetchConfig) -> Result<Download> {
        debug!("downloading {}", url);

        let response = self.client(url, config)?.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Download { url: url.to_string(), reason: status.to_string() });
        }

        let final_url = response.url().clone();
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(mime_essence)
            .unwrap_or_default();
        let text = response.text()?;

        Ok(Download { text, final_url, mime_type })
    }
}

/// Content type without its parameters, lowercase
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Split text in lines, carriage returns removed
pub fn split_lines(text: &str) -> Vec<String> {
    text.replace('\r', "").split('\n').map(str::to_string).collect()
}

/// Load the lines of a text file
#[instrument]
pub fn load_lines(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(split_lines(&text))
}

/// Save lines in a text file, each one terminated by a line feed
#[instrument(skip(lines))]
pub fn save_lines(lines: &[String], path: &Path) -> Result<()> {
    let mut text = lines.join("\n");
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    std::fs::write(path, text)?;
    Ok(())
}
