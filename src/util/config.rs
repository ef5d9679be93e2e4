//! Configuration file support for harbour-layout.
//!
//! Two configuration file locations are read:
//! - Global: `~/.harbour-layout/config.toml` - User-wide defaults
//! - Project: `.harbour-layout/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::diagnostic::Diagnostic;

/// Directory name used for both global and project configuration.
pub const CONFIG_DIR: &str = ".harbour-layout";

/// harbour-layout configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default target triple when neither the command line nor the schema
    /// names one
    pub target: Option<String>,

    /// Extra directories searched for schema files given by bare name
    pub schema_paths: Vec<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, falling back to defaults when the file is missing
    /// or unreadable. A bad file comes back as a warning naming it.
    pub fn load_or_default(path: &Path) -> (Self, Option<Diagnostic>) {
        if !path.exists() {
            return (Self::default(), None);
        }

        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => {
                tracing::debug!("failed to load config from {}: {:#}", path.display(), e);
                let warning = Diagnostic::warning("ignoring invalid config file")
                    .with_location(path)
                    .with_context(format!("{:#}", e));
                (Self::default(), Some(warning))
            }
        }
    }

    /// Merge another config into this one (other takes precedence).
    ///
    /// Schema paths accumulate, with the overriding config's paths searched
    /// first.
    pub fn merge(&mut self, other: Config) {
        if other.target.is_some() {
            self.target = other.target;
        }
        if !other.schema_paths.is_empty() {
            let mut paths = other.schema_paths;
            paths.append(&mut self.schema_paths);
            self.schema_paths = paths;
        }
    }

    /// Find a schema file by path or by name in the configured directories.
    pub fn find_schema(&self, name: &str) -> Option<PathBuf> {
        let direct = PathBuf::from(name);
        if direct.is_file() {
            return Some(direct);
        }

        let file_name = if name.ends_with(".toml") {
            name.to_string()
        } else {
            format!("{}.toml", name)
        };
        self.schema_paths
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.harbour-layout/config.toml)
/// 2. Global config (~/.harbour-layout/config.toml)
/// 3. Defaults
///
/// Files that fail to parse are skipped and reported in the returned
/// warnings.
pub fn load_config(global_path: &Path, project_path: &Path) -> (Config, Vec<Diagnostic>) {
    let mut config = Config::default();
    let mut warnings = Vec::new();

    for path in [global_path, project_path] {
        let (loaded, warning) = Config::load_or_default(path);
        config.merge(loaded);
        warnings.extend(warning);
    }

    (config, warnings)
}

/// Get the global config directory (~/.harbour-layout).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR))
}

/// Get the global config path (~/.harbour-layout/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.harbour-layout/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.toml")
}

/// Load the global and project configuration for a working directory.
pub fn load_for(project_root: &Path) -> (Config, Vec<Diagnostic>) {
    let project = project_config_path(project_root);
    match global_config_path() {
        Some(global) => load_config(&global, &project),
        None => load_config(Path::new(""), &project),
    }
}
