pub mod check;
pub mod config;
pub mod scrape;
pub mod status;
pub mod sync;

use std::path::PathBuf;

use anyhow::Result;
use trailcal_core::config::TrailcalConfig;
use trailcal_core::identity::Namespace;

/// Config file values with command-line overrides applied.
pub struct Settings {
    pub config: TrailcalConfig,
    pub races: PathBuf,
    pub namespace: Namespace,
}

impl Settings {
    pub fn resolve(races: Option<PathBuf>, prefix: Option<String>) -> Result<Self> {
        let config = TrailcalConfig::load()?;

        let races = races.unwrap_or_else(|| config.races_path());
        let namespace = match prefix {
            Some(prefix) => Namespace::new(prefix)?,
            None => config.prefix.clone(),
        };

        Ok(Settings {
            config,
            races,
            namespace,
        })
    }
}
