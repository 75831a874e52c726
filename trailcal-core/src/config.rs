//! Global trailcal configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{TrailcalError, TrailcalResult};
use crate::identity::Namespace;
use crate::remote::Remote;

static DEFAULT_RACES_FILE: &str = "races.json";

fn default_races_file() -> PathBuf {
    PathBuf::from(DEFAULT_RACES_FILE)
}

/// Configuration at ~/.config/trailcal/config.toml
///
/// Every key can be overridden with a `TRAILCAL_` environment variable,
/// e.g. `TRAILCAL_RACES_FILE` or `TRAILCAL_PREFIX`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrailcalConfig {
    #[serde(default = "default_races_file")]
    pub races_file: PathBuf,

    #[serde(default)]
    pub prefix: Namespace,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<Remote>,
}

impl Default for TrailcalConfig {
    fn default() -> Self {
        TrailcalConfig {
            races_file: default_races_file(),
            prefix: Namespace::default(),
            remote: None,
        }
    }
}

impl TrailcalConfig {
    pub fn config_path() -> TrailcalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TrailcalError::Config("Could not determine config directory".into()))?
            .join("trailcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, writing a commented default on first use.
    pub fn load() -> TrailcalResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load config from `path` (which may be missing) plus the environment.
    pub fn load_from(path: &Path) -> TrailcalResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("TRAILCAL"))
            .build()
            .map_err(|e| TrailcalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| TrailcalError::Config(e.to_string()))
    }

    /// The races file with `~` expanded.
    pub fn races_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.races_file.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    /// The configured remote, or a pointer to where to configure one.
    pub fn remote(&self) -> TrailcalResult<&Remote> {
        self.remote.as_ref().ok_or_else(|| {
            TrailcalError::Config(
                "No remote configured. Add a [remote] table with a provider to config.toml".into(),
            )
        })
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> TrailcalResult<()> {
        let contents = format!(
            "\
# trailcal configuration

# Declared race list:
# races_file = \"{DEFAULT_RACES_FILE}\"

# Prefix of the event ids trailcal owns in the remote calendar:
# prefix = \"{}\"

# Remote calendar, reached through the trailcal-provider-<provider> binary:
# [remote]
# provider = \"google\"
# google_account = \"you@example.com\"
# google_calendar_id = \"primary\"
",
            Namespace::default()
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;

        Ok(())
    }
}
