//! Parley configuration.
//!
//! Two independent inputs feed the server:
//! - server settings, a TOML file where every field has a serde default
//! - the engine configuration, an opaque JSON document handed to the backend
//!
//! ```rust,no_run
//! use parley_config::{load_settings, EngineDocument};
//!
//! let settings = load_settings(None).expect("failed to load settings");
//! if let Some(path) = &settings.engine.config_path {
//!     let doc = EngineDocument::load(path).expect("bad engine config");
//!     println!("model hint: {:?}", doc.model());
//! }
//! ```

pub mod engine;
pub mod loader;
pub mod schema;
pub mod validation;

pub use engine::EngineDocument;
pub use schema::{BackendKind, DialogueSettings, EngineSettings, ServerSettings, Settings};

use parley_common::ConfigError;
use std::path::Path;

/// Load settings from an explicit path, or from the platform default path
/// when `path` is `None`, then validate them.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let settings = match path {
        Some(p) => loader::load_from_path(p)?,
        None => loader::load_default()?,
    };
    validation::validate(&settings)?;
    Ok(settings)
}
