//! Action catalog and engine configuration.
//!
//! A catalog is a TOML document with an optional `[engine]` table, an optional
//! `[semantic]` table, and an `[[actions]]` array:
//!
//! ```toml
//! [engine]
//! semantic_timeout_ms = 2000
//!
//! [semantic]
//! endpoint = "http://localhost:8080/resolve"
//!
//! [[actions]]
//! id = "image"
//! label = "Generate image"
//! description = "Create an image from a prompt"
//! keywords = ["image", "picture"]
//! slash_command = "image"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ActionError, Result};
use crate::registry::{ActionDefinition, ActionRegistry};

/// Default bound on a single Stage 2 call.
pub const DEFAULT_SEMANTIC_TIMEOUT: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Resolution engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long Stage 2 may run before the engine falls back to Stage 1.
    #[serde(
        rename = "semantic_timeout_ms",
        with = "duration_ms",
        default = "default_semantic_timeout"
    )]
    pub semantic_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            semantic_timeout: DEFAULT_SEMANTIC_TIMEOUT,
        }
    }
}

impl EngineConfig {
    /// Override the Stage 2 timeout.
    #[must_use]
    pub fn with_semantic_timeout(mut self, timeout: Duration) -> Self {
        self.semantic_timeout = timeout;
        self
    }
}

fn default_semantic_timeout() -> Duration {
    DEFAULT_SEMANTIC_TIMEOUT
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// SemanticConfig
// ---------------------------------------------------------------------------

/// Where to find an external semantic resolver, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// HTTP endpoint accepting `{ input, actions }` and returning IDs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

// ---------------------------------------------------------------------------
// CatalogConfig
// ---------------------------------------------------------------------------

/// A complete action catalog as loaded from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub semantic: SemanticConfig,

    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

impl CatalogConfig {
    /// Parse a catalog from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let catalog: Self = toml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read and parse a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            actions = catalog.actions.len(),
            "action catalog loaded"
        );
        Ok(catalog)
    }

    /// Build the registry from the catalog's actions.
    pub fn into_registry(self) -> Result<ActionRegistry> {
        ActionRegistry::register(self.actions)
    }

    fn validate(&self) -> Result<()> {
        if self.engine.semantic_timeout.is_zero() {
            return Err(ActionError::Config {
                reason: "engine.semantic_timeout_ms must be greater than zero".into(),
            });
        }
        if let Some(endpoint) = &self.semantic.endpoint
            && endpoint.trim().is_empty()
        {
            return Err(ActionError::Config {
                reason: "semantic.endpoint must not be empty".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
