// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// history_limit = 200
///
/// [script.scraper]
/// name = "Web scraper"
/// working_directory = "/srv/scraper"
/// script = "main.py"
/// venv = "venv"
/// ```
///
/// All sections are optional; an empty script table is valid (the
/// supervisor simply has nothing to manage yet).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All managed scripts from `[script.<id>]`.
    ///
    /// Keys are the *script identifiers* (stable unique strings); the
    /// map itself guarantees at most one descriptor per id.
    #[serde(default)]
    pub script: BTreeMap<String, ScriptConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of persisted log chunks replayed to an observer
    /// per history request.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    200
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

/// `[script.<id>]` section: one managed script descriptor.
///
/// Read-only to the supervisor core; editing the table is the config
/// layer's business, not ours.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptConfig {
    /// Human-readable display name.
    #[serde(default)]
    pub name: String,

    /// Directory the script runs in; also the root the virtual
    /// environment is resolved against.
    pub working_directory: String,

    /// Script path, relative to `working_directory`.
    pub script: String,

    /// Virtual-environment directory name inside `working_directory`.
    ///
    /// If `None`, the conventional `venv` is used.
    #[serde(default)]
    pub venv: Option<String>,

    /// Runtime binary name looked up inside `<venv>/bin/`.
    ///
    /// If `None`, defaults to `python`.
    #[serde(default)]
    pub runtime: Option<String>,
}

impl ScriptConfig {
    /// Effective virtual-environment directory name.
    pub fn effective_venv(&self) -> &str {
        self.venv.as_deref().unwrap_or("venv")
    }

    /// Effective runtime binary name.
    pub fn effective_runtime(&self) -> &str {
        self.runtime.as_deref().unwrap_or("python")
    }

    /// Full path of the interpreter this script is expected to run
    /// under: `working_directory/<venv>/bin/<runtime>`.
    pub fn interpreter_path(&self) -> PathBuf {
        Path::new(&self.working_directory)
            .join(self.effective_venv())
            .join("bin")
            .join(self.effective_runtime())
    }
}
