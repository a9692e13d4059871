use std::{path::PathBuf, time::Duration};

use config::{Config, ConfigError};
use serde::{Deserialize, Deserializer};

pub static DEFAULT_SETTINGS_FILE: &str = "settings.toml";

static ENV_PREFIX: &str = "ASSET_CATALOG";

/// Settings for the asset catalog cache.
///
/// Defaults mirror the asset repository bundled with the deployment:
/// chain directories under `./assets/blockchains` and the persisted ID
/// mapping next to them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub assets_path: PathBuf,
    pub id_mapping_file: PathBuf,
    #[serde(deserialize_with = "deserialize_duration_secs_from_u64")]
    pub cache_ttl: Duration,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            assets_path: "./assets/blockchains".into(),
            id_mapping_file: "./assets/id_mappings.json".into(),
            cache_ttl: Duration::from_secs(30 * 60),
        }
    }
}

impl CatalogSettings {
    /// Reads settings from an optional TOML file overridden by
    /// `ASSET_CATALOG__*` environment variables.
    pub fn try_read_file(file: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .and_then(Config::try_deserialize)
    }

    pub fn read_file_or_default(file: &str) -> Self {
        Self::try_read_file(file)
            .map_err(|error| {
                log::warn!("config error: {error}, going on with default config...");
            })
            .unwrap_or_default()
    }
}

fn deserialize_duration_secs_from_u64<'de, D>(d: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(d).map(Duration::from_secs)
}
