//! Server settings schema.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1 << 20;

/// Root settings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub engine: EngineSettings,
    pub dialogue: DialogueSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Upper bound on request body size.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Which backend implementation drives the dialogues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Streams the formatted prompt back. No model required.
    #[default]
    Echo,
    /// Genie dialog SDK via FFI.
    Genie,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "echo" => Ok(Self::Echo),
            "genie" => Ok(Self::Genie),
            other => Err(format!("unknown backend '{other}' (expected echo or genie)")),
        }
    }
}

/// Engine settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub backend: BackendKind,
    /// Path to the engine JSON configuration.
    pub config_path: Option<PathBuf>,
    /// Working directory the engine resolves relative model paths against.
    pub base_dir: Option<PathBuf>,
    /// Prompt template family override (`llama3`, `llama3-taide`, `llama2`).
    pub template: Option<String>,
}

/// Settings for the server's default dialogue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueSettings {
    /// Keep backend memory across `/chat` turns instead of resetting.
    pub stateful: bool,
}
