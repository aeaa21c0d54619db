//! Startup: settings, engine configuration, and the session manager.

use std::sync::Arc;

use parley_common::{ConfigError, DialogueId, ParleyError};
use parley_config::{validation, BackendKind, EngineDocument, Settings};
use parley_dialog::{EchoEngine, Engine, ModelFamily, SessionManager};
use tracing::info;

use crate::cli::Args;

/// Everything the HTTP layer needs, built once at process start.
pub struct Bootstrap {
    pub settings: Settings,
    pub manager: Arc<SessionManager>,
    pub default_dialogue: DialogueId,
}

/// CLI flags win over the settings file.
pub fn apply_overrides(settings: &mut Settings, args: &Args) {
    if let Some(host) = &args.host {
        settings.server.host = host.clone();
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if let Some(path) = &args.engine_config {
        settings.engine.config_path = Some(path.clone());
    }
    if let Some(dir) = &args.base_dir {
        settings.engine.base_dir = Some(dir.clone());
    }
    if let Some(template) = &args.template {
        settings.engine.template = Some(template.clone());
    }
    if let Some(backend) = args.backend {
        settings.engine.backend = backend;
    }
    if args.stateful {
        settings.dialogue.stateful = true;
    }
}

/// Template family: explicit setting, then the engine document's model hint,
/// then Llama 3.
pub fn resolve_family(
    settings: &Settings,
    document: Option<&EngineDocument>,
) -> Result<ModelFamily, ConfigError> {
    if let Some(name) = &settings.engine.template {
        return name.parse();
    }
    match document.and_then(EngineDocument::model) {
        Some(name) => name.parse(),
        None => Ok(ModelFamily::default()),
    }
}

fn load_document(settings: &Settings) -> Result<Option<EngineDocument>, ConfigError> {
    let document = match &settings.engine.config_path {
        Some(path) => Some(EngineDocument::load(path)?),
        None => None,
    };
    if settings.engine.backend == BackendKind::Genie && document.is_none() {
        return Err(ConfigError::ValidationError(
            "the genie backend needs an engine config (--engine-config)".into(),
        ));
    }
    Ok(document)
}

fn enter_base_dir(settings: &Settings) -> Result<(), ParleyError> {
    let Some(dir) = &settings.engine.base_dir else {
        return Ok(());
    };
    if !dir.is_dir() {
        return Err(ConfigError::FileNotFound(dir.clone()).into());
    }
    std::env::set_current_dir(dir)?;
    info!("working directory set to {}", dir.display());
    Ok(())
}

fn build_engine(
    backend: BackendKind,
    document: Option<&EngineDocument>,
) -> Result<Box<dyn Engine>, ConfigError> {
    match backend {
        BackendKind::Echo => Ok(Box::new(EchoEngine::new())),
        BackendKind::Genie => genie_engine(document),
    }
}

#[cfg(feature = "genie")]
fn genie_engine(document: Option<&EngineDocument>) -> Result<Box<dyn Engine>, ConfigError> {
    let document = document.ok_or_else(|| {
        ConfigError::ValidationError("the genie backend needs an engine config".into())
    })?;
    Ok(Box::new(parley_dialog::GenieEngine::from_json(document.raw())?))
}

#[cfg(not(feature = "genie"))]
fn genie_engine(_document: Option<&EngineDocument>) -> Result<Box<dyn Engine>, ConfigError> {
    Err(ConfigError::ValidationError(
        "this build has no genie backend, rebuild with --features genie".into(),
    ))
}

/// Load settings, create the engine and the server's default dialogue.
pub fn bootstrap(args: &Args) -> Result<Bootstrap, ParleyError> {
    let mut settings = parley_config::load_settings(args.config.as_deref())?;
    apply_overrides(&mut settings, args);
    validation::validate(&settings)?;

    // Read the engine config before changing directory: its path is
    // relative to where we were started.
    let document = load_document(&settings)?;
    enter_base_dir(&settings)?;

    let family = resolve_family(&settings, document.as_ref())?;
    let engine = build_engine(settings.engine.backend, document.as_ref())?;
    let manager = Arc::new(SessionManager::new(engine, family));

    let default_dialogue = manager
        .create_dialogue(settings.dialogue.stateful)
        .map_err(|e| ParleyError::Engine(e.to_string()))?;

    info!(
        backend = ?settings.engine.backend,
        template = %family,
        dialogue = %default_dialogue,
        stateful = settings.dialogue.stateful,
        "engine ready"
    );

    Ok(Bootstrap {
        settings,
        manager,
        default_dialogue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_settings() {
        let mut settings = Settings::default();
        let args = Args {
            host: Some("127.0.0.1".into()),
            port: Some(9000),
            template: Some("llama2".into()),
            backend: Some(BackendKind::Genie),
            stateful: true,
            ..Args::default()
        };
        apply_overrides(&mut settings, &args);

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.engine.template.as_deref(), Some("llama2"));
        assert_eq!(settings.engine.backend, BackendKind::Genie);
        assert!(settings.dialogue.stateful);
    }

    #[test]
    fn absent_overrides_keep_settings() {
        let mut settings = Settings::default();
        settings.dialogue.stateful = true;
        apply_overrides(&mut settings, &Args::default());
        assert_eq!(settings.server.port, 8080);
        assert!(settings.dialogue.stateful);
    }

    #[test]
    fn family_precedence() {
        let doc = EngineDocument::parse(r#"{"model":"llama2"}"#).unwrap();
        let mut settings = Settings::default();

        assert_eq!(resolve_family(&settings, None).unwrap(), ModelFamily::Llama3);
        assert_eq!(
            resolve_family(&settings, Some(&doc)).unwrap(),
            ModelFamily::Llama2
        );

        settings.engine.template = Some("taide".into());
        assert_eq!(
            resolve_family(&settings, Some(&doc)).unwrap(),
            ModelFamily::Llama3Taide
        );
    }

    #[test]
    fn unknown_family_is_config_error() {
        let doc = EngineDocument::parse(r#"{"model":"gpt"}"#).unwrap();
        let err = resolve_family(&Settings::default(), Some(&doc)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn genie_backend_requires_document() {
        let mut settings = Settings::default();
        settings.engine.backend = BackendKind::Genie;
        let err = load_document(&settings).unwrap_err();
        assert!(err.to_string().contains("engine config"));
    }

    #[test]
    fn missing_base_dir_rejected() {
        let mut settings = Settings::default();
        settings.engine.base_dir = Some("/tmp/parley_no_such_dir".into());
        let err = enter_base_dir(&settings).unwrap_err();
        assert!(matches!(err, ParleyError::Config(ConfigError::FileNotFound(_))));
    }

    #[cfg(not(feature = "genie"))]
    #[test]
    fn genie_unavailable_without_feature() {
        let doc = EngineDocument::parse("{}").unwrap();
        assert!(build_engine(BackendKind::Genie, Some(&doc)).is_err());
    }

    #[test]
    fn bootstrap_with_echo_backend() {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join("config.toml");
        let engine_path = dir.path().join("engine.json");
        std::fs::write(&settings_path, "[dialogue]\nstateful = true\n").unwrap();
        std::fs::write(&engine_path, r#"{"model":"llama3"}"#).unwrap();

        let args = Args {
            config: Some(settings_path),
            engine_config: Some(engine_path),
            ..Args::default()
        };
        let boot = bootstrap(&args).unwrap();

        assert!(boot.settings.dialogue.stateful);
        assert_eq!(boot.manager.family(), ModelFamily::Llama3);
        assert!(boot.manager.contains(&boot.default_dialogue));
        assert_eq!(boot.manager.dialogue_count(), 1);
    }

    #[test]
    fn bootstrap_rejects_malformed_engine_json() {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join("config.toml");
        let engine_path = dir.path().join("engine.json");
        std::fs::write(&settings_path, "").unwrap();
        std::fs::write(&engine_path, "{ not json").unwrap();

        let args = Args {
            config: Some(settings_path),
            engine_config: Some(engine_path),
            ..Args::default()
        };
        let err = bootstrap(&args).err().unwrap();
        assert!(matches!(err, ParleyError::Config(ConfigError::ParseError(_))));
    }
}
