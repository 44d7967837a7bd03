//! Application configuration.
//!
//! Layered with the `config` crate: `config/default`, `config/{RUN_MODE}`,
//! `config/local` (all optional), then `PETFLY__SECTION__KEY` environment
//! variables. Every field has a default, so an empty environment loads.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{de, Deserialize, Deserializer};

use crate::mapper::MapperDefaults;
use crate::repository::RepositoryKind;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub repository: RepositoryConfig,
    pub results: ResultsConfig,
    pub mapper: MapperDefaults,
    pub preferences: PreferencesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub booking_base_url: String,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://apiflight.petfly.io/api".to_string(),
            booking_base_url: "https://api.travelpayouts.com/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub kind: RepositoryKind,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    #[serde(deserialize_with = "positive")]
    pub initial_window: usize,
    /// A zero step would leave "load more" stuck, so it is rejected.
    #[serde(deserialize_with = "positive")]
    pub load_more_step: usize,
}

fn positive<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let value = usize::deserialize(deserializer)?;
    if value == 0 {
        return Err(de::Error::custom("must be greater than zero"));
    }
    Ok(value)
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            initial_window: 50,
            load_more_step: 25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    /// JSON file backing the persisted selections; in-memory when unset.
    pub path: Option<PathBuf>,
    pub default_language: String,
    pub default_currency: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: None,
            default_language: "es".to_string(),
            default_currency: "USD".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            // Not checked in.
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("PETFLY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::FilterRequestMode;
    use config::{Config, File, FileFormat};

    fn from_toml(source: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_source_yields_defaults() {
        let config = from_toml("");
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.repository.kind, RepositoryKind::Fake);
        assert_eq!(config.results.initial_window, 50);
        assert_eq!(config.results.load_more_step, 25);
        assert_eq!(config.mapper.origin, "BOG");
        assert_eq!(config.preferences.default_currency, "USD");
    }

    #[test]
    fn zero_load_more_step_is_rejected() {
        let result = Config::builder()
            .add_source(File::from_str(
                "[results]\nload_more_step = 0\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>();
        assert!(result.is_err());

        let config = from_toml("[results]\ninitial_window = 10\nload_more_step = 5\n");
        assert_eq!(config.results.initial_window, 10);
        assert_eq!(config.results.load_more_step, 5);
    }

    #[test]
    fn sections_override_individually() {
        let config = from_toml(
            r#"
            [api]
            base_url = "http://localhost:3000"
            timeout_secs = 5

            [repository]
            kind = "http"

            [mapper]
            filter_mode = "sparse"
            "#,
        );
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.api.booking_base_url, "https://api.travelpayouts.com/v1");
        assert_eq!(config.repository.kind, RepositoryKind::Http);
        assert_eq!(config.mapper.filter_mode, FilterRequestMode::Sparse);
        assert_eq!(config.mapper.breed, "Mixed");
    }
}
