// src/config/validate.rs

use anyhow::{Result, anyhow};

use crate::config::model::{ConfigFile, ScriptConfig};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - `history_limit >= 1`
/// - every script has a non-empty `working_directory` and `script`
/// - `venv` / `runtime` overrides are bare names, not paths
///
/// It does **not** check that working directories or interpreters exist
/// on disk: scripts may live on volumes mounted after startup, and the
/// supervisor re-checks the interpreter path on every `start` anyway.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    for (id, script) in cfg.script.iter() {
        validate_script(id, script)?;
    }
    Ok(())
}

fn validate_global_config(cfg: &ConfigFile) -> Result<()> {
    if cfg.config.history_limit == 0 {
        return Err(anyhow!("[config].history_limit must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_script(id: &str, script: &ScriptConfig) -> Result<()> {
    if id.trim().is_empty() {
        return Err(anyhow!("script identifier must not be blank"));
    }
    if script.working_directory.trim().is_empty() {
        return Err(anyhow!(
            "script '{}' has an empty `working_directory`",
            id
        ));
    }
    if script.script.trim().is_empty() {
        return Err(anyhow!("script '{}' has an empty `script` path", id));
    }

    for (field, value) in [
        ("venv", script.venv.as_deref()),
        ("runtime", script.runtime.as_deref()),
    ] {
        if let Some(value) = value {
            if value.is_empty() || value.contains(['/', '\\']) {
                return Err(anyhow!(
                    "script '{}' has invalid `{}` '{}': expected a bare directory/binary name",
                    id,
                    field,
                    value
                ));
            }
        }
    }

    Ok(())
}
