//! Session configuration
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration file. The CLI layers its flags on top of the file.

use crate::error::{BananaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Where the backend lives and how hard to try reaching it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub base_url: Url,
    /// Catalog (GET) and type table (POST)
    pub metadata_path: String,
    pub typecheck_path: String,
    pub submit_path: String,
    /// Attempts after the first one for catalog loads and refreshes
    pub retries: u32,
    /// Per-attempt timeout; none waits forever
    pub timeout_ms: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:3000/").expect("default base url"),
            metadata_path: "/banana/metadata".to_string(),
            typecheck_path: "/banana/typeck".to_string(),
            submit_path: "/banana".to_string(),
            retries: 2,
            timeout_ms: None,
        }
    }
}

impl SessionConfig {
    /// Creates a configuration for the backend at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            ..Self::default()
        })
    }

    /// Reads a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| BananaError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), base_url = %config.base_url, "loaded session config");
        Ok(config)
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn metadata_url(&self) -> Result<Url> {
        self.endpoint(&self.metadata_path)
    }

    pub fn typecheck_url(&self) -> Result<Url> {
        self.endpoint(&self.typecheck_path)
    }

    pub fn submit_url(&self) -> Result<Url> {
        self.endpoint(&self.submit_path)
    }

    /// Resolves an endpoint path below the base URL, keeping any path
    /// prefix the base URL carries
    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let prefixed = format!("{}/", base.path());
            base.set_path(&prefixed);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }
}
