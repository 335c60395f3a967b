//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tfwrap/tfwrap.toml`
//! 3. Environment variables: `TFWRAP_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// How per-call target directories reach the binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChdirStyle {
    /// Global `-chdir=<dir>` option ahead of the subcommand (binaries >= 1.0)
    #[default]
    Chdir,
    /// Trailing positional directory argument (older binaries)
    Positional,
}

/// Raw settings for intermediate parsing (fields are Option to detect
/// "not specified" during merging).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub bin_path: Option<String>,
    pub parallelism: Option<u32>,
    pub inherit_env: Option<bool>,
    pub chdir_style: Option<ChdirStyle>,
}

/// Unified configuration for tfwrap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Terraform binary: a name resolved on PATH or an absolute path
    pub bin_path: String,
    /// Default `-parallelism` for lifecycle commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
    /// Pass the parent environment to the binary
    pub inherit_env: bool,
    /// How per-call target directories reach the binary
    pub chdir_style: ChdirStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bin_path: "terraform".to_string(),
            parallelism: None,
            inherit_env: true,
            chdir_style: ChdirStyle::default(),
        }
    }
}

/// Get the XDG config directory for tfwrap.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tfwrap").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tfwrap.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge overlay config onto self (base): overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            bin_path: overlay
                .bin_path
                .clone()
                .unwrap_or_else(|| self.bin_path.clone()),
            parallelism: overlay.parallelism.or(self.parallelism),
            inherit_env: overlay.inherit_env.unwrap_or(self.inherit_env),
            chdir_style: overlay.chdir_style.unwrap_or(self.chdir_style),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/tfwrap/tfwrap.toml`
    /// 3. Environment variables: `TFWRAP_*` prefix (explicit override)
    pub fn load() -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply TFWRAP_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(Environment::with_prefix("TFWRAP"));
        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("bin_path") {
            settings.bin_path = val;
        }
        if let Ok(val) = config.get_int("parallelism") {
            settings.parallelism = Some(val as u32);
        }
        if let Ok(val) = config.get_bool("inherit_env") {
            settings.inherit_env = val;
        }
        if let Ok(val) = config.get_string("chdir_style") {
            settings.chdir_style = match val.as_str() {
                "chdir" => ChdirStyle::Chdir,
                "positional" => ChdirStyle::Positional,
                other => {
                    return Err(ApplicationError::Config {
                        message: format!("invalid chdir_style: {other}"),
                    })
                }
            };
        }

        Ok(settings)
    }

    /// Expand shell variables and tilde in the binary path.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax.
    fn expand_paths(&mut self) {
        self.bin_path = shellexpand::full(&self.bin_path)
            .map(|expanded| expanded.into_owned())
            .unwrap_or_else(|_| self.bin_path.clone());
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# tfwrap configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/tfwrap/tfwrap.toml
#   Env:    TFWRAP_* environment variables (explicit overrides)

# Terraform binary: a name resolved on PATH or an absolute path
# bin_path = "terraform"

# Default -parallelism for apply/destroy/plan
# parallelism = 10

# Pass the parent environment to the binary (false runs with overrides only)
# inherit_env = true

# "chdir" renders target directories as the global -chdir option (1.0 and
# newer), "positional" appends them as a trailing argument (older binaries)
# chdir_style = "chdir"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
