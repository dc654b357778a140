use std::time::Duration;

use reqwest::Url;

use crate::error::{ClientError, Result};

/// Base URL used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Candidates requested per feed page.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Drag distance past which a release counts as a decision.
pub const DEFAULT_DECISION_THRESHOLD: f64 = 100.0;

/// Client settings. One base URL serves every REST call and the channel.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// Path of the real-time channel endpoint under the base URL.
    pub channel_path: String,
    pub page_size: usize,
    pub decision_threshold: f64,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            channel_path: "/ws".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
            request_timeout: Duration::from_secs(10),
        })
    }

    /// Settings for [`DEFAULT_BASE_URL`].
    pub fn local() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL)
    }

    /// Runtime `SWIPE_BASE_URL`, then the value baked in at compile time, then the default.
    pub fn from_env() -> Result<Self> {
        let base = std::env::var("SWIPE_BASE_URL")
            .ok()
            .or_else(|| option_env!("SWIPE_BASE_URL").map(str::to_string))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(&base)
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Absolute URL for a REST path such as `/feed`.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Config(format!("bad endpoint {path}: {e}")))
    }

    /// [`Self::endpoint`] with `segments` appended as escaped path segments,
    /// so an id can never reach into the query or another route.
    pub fn resource(&self, path: &str, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("cannot extend {path}")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// WebSocket URL of the real-time channel.
    pub fn channel_url(&self) -> Result<Url> {
        let mut url = self.endpoint(&self.channel_path)?;
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            "ws" | "wss" => return Ok(url),
            other => return Err(ClientError::Config(format!("unsupported scheme {other}"))),
        };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::Config(format!("cannot use {scheme} for {url}")))?;
        Ok(url)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    // Url::join drops the last segment unless the base ends in '/'.
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&normalized)
        .map_err(|e| ClientError::Config(format!("invalid base url {raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::Config(format!(
            "base url must be http(s), got {other}"
        ))),
    }
}
