//! Engine configuration.
//!
//! Configuration is read from a `.toml` or `.json` file; the format is chosen
//! by extension. Every key is optional.
//!
//! ```toml
//! base_url = "http://schema.site.com"
//!
//! [highlighted]
//! "engagement-event" = ["Click", "Zoom", "Scroll"]
//! event = ["Click", "Login", "Open", "View"]
//!
//! [categories]
//! main = ["@type", "object", "intent", "target", "name", "origin"]
//! technical = ["schema", "@id", "creationDate"]
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::schema::{ENGAGEMENT_SCHEMA_KEY, TRACKER_SCHEMA_KEY};

/// Default base of canonical schema URLs.
pub const DEFAULT_BASE_URL: &str = "http://schema.site.com";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config file extension: {0:?}")]
    UnsupportedExtension(String),
}

/// Root field grouping lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// Fields shown first, in this order.
    pub main: Vec<String>,
    /// Tracking plumbing fields, in this order.
    pub technical: Vec<String>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            main: to_strings(&["@type", "object", "intent", "target", "name", "origin"]),
            technical: to_strings(&[
                "schema",
                "@id",
                "creationDate",
                "tracker",
                "device",
                "provider",
                "actor",
                "session",
                "experiments",
            ]),
        }
    }
}

/// Settings shared by every session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base of the canonical URL written to the event's `schema` key.
    pub base_url: String,
    /// Root schema keys the catalog must publish, with the type names to
    /// highlight for each.
    pub highlighted: BTreeMap<String, Vec<String>>,
    pub categories: CategoryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut highlighted = BTreeMap::new();
        highlighted.insert(
            ENGAGEMENT_SCHEMA_KEY.to_string(),
            to_strings(&["Click", "Zoom", "Scroll"]),
        );
        highlighted.insert(
            TRACKER_SCHEMA_KEY.to_string(),
            to_strings(&["Click", "Login", "Open", "View"]),
        );
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            highlighted,
            categories: CategoryConfig::default(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl EngineConfig {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        Self::parse(&content, ext)
    }

    /// Parse configuration text in the format named by `ext`.
    pub fn parse(content: &str, ext: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        match ext {
            "toml" => Ok(toml::from_str(content)?),
            "json" => Ok(serde_json::from_str(content)?),
            ext => Err(ConfigError::UnsupportedExtension(ext.to_string())),
        }
    }
}
