//! Engine configuration document.
//!
//! The backend owns the schema of this JSON; the only key read here is an
//! optional top-level `"model"` used to pick the prompt template family.

use parley_common::ConfigError;
use std::path::Path;
use tracing::info;

/// A validated engine configuration: raw JSON text plus the model hint.
#[derive(Debug, Clone)]
pub struct EngineDocument {
    raw: String,
    model: Option<String>,
}

impl EngineDocument {
    /// Parse engine configuration text. It must be a JSON object.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = raw.into();
        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::ParseError(format!("invalid engine JSON: {e}")))?;

        let object = value.as_object().ok_or_else(|| {
            ConfigError::ParseError("engine config must be a JSON object".into())
        })?;

        let model = object
            .get("model")
            .and_then(|m| m.as_str())
            .map(str::to_string);

        Ok(Self { raw, model })
    }

    /// Read and parse an engine configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::ParseError(format!("failed to read {}: {e}", path.display()))
        })?;
        let doc = Self::parse(raw)?;
        info!("loaded engine config from {}", path.display());
        Ok(doc)
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Model family hint, if the document carries one.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}
