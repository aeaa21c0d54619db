//! Settings validation. Collects every problem into one `ConfigError`.

use crate::schema::Settings;
use parley_common::ConfigError;

const MIN_BODY_BYTES: usize = 1024;
const MAX_BODY_BYTES: usize = 64 << 20;

/// Run all validations on the settings, collecting all errors.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    if settings.server.host.trim().is_empty() {
        errors.push("server.host must not be empty".into());
    }
    if settings.server.port == 0 {
        errors.push("server.port must be non-zero".into());
    }
    let body = settings.server.max_body_bytes;
    if !(MIN_BODY_BYTES..=MAX_BODY_BYTES).contains(&body) {
        errors.push(format!(
            "server.max_body_bytes = {body} is out of range [{MIN_BODY_BYTES}, {MAX_BODY_BYTES}]"
        ));
    }
    if let Some(template) = &settings.engine.template {
        if template.trim().is_empty() {
            errors.push("engine.template must not be empty when set".into());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
