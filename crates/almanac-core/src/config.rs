use anyhow::Result;
use config::{Config, ConfigBuilder, builder::DefaultState};
use serde::Deserialize;

use crate::constants::{DEFAULT_MAX_INSTANCES, DEFAULT_TIME_ZONE, DEFAULT_WINDOW_DAYS};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: Option<DatabaseConfig>,
    pub logging: LoggingConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u8,
}

const fn default_max_connections() -> u8 {
    4
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Knobs for occurrence generation.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// IANA zone whose wall clock recurrence rules are expanded in.
    pub time_zone: String,
    /// Days covered by the eager generation run when a specification is created.
    pub default_window_days: u32,
    /// Cap on instants produced by one otherwise unbounded expansion.
    pub max_instances: u16,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            default_window_days: DEFAULT_WINDOW_DAYS,
            max_instances: DEFAULT_MAX_INSTANCES,
        }
    }
}

impl GenerationConfig {
    /// ## Summary
    /// Resolves the configured time zone name.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` if the name is not a known IANA zone.
    pub fn zone(&self) -> CoreResult<chrono_tz::Tz> {
        self.time_zone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| {
                CoreError::ConfigError(format!("unknown time zone {}: {e}", self.time_zone))
            })
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `ALMANAC_`-prefixed environment variables
    /// (`ALMANAC_GENERATION__TIME_ZONE`) and an optional `config.toml`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        let builder = Self::defaults()?
            .add_source(
                config::Environment::with_prefix("ALMANAC")
                    .prefix_separator("_")
                    .convert_case(config::Case::Snake)
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .add_source(config::File::with_name("config.toml").required(false));

        Ok(builder.build()?.try_deserialize::<Settings>()?)
    }

    /// ## Summary
    /// Returns a builder pre-populated with every default value.
    ///
    /// ## Errors
    /// Returns an error if a default cannot be registered.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("logging.level", "info")?
            .set_default("generation.time_zone", DEFAULT_TIME_ZONE)?
            .set_default(
                "generation.default_window_days",
                i64::from(DEFAULT_WINDOW_DAYS),
            )?
            .set_default("generation.max_instances", i64::from(DEFAULT_MAX_INSTANCES))?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    tracing::debug!(time_zone = %settings.generation.time_zone, "Settings loaded");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> Settings {
        Settings::defaults()
            .expect("defaults")
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .expect("build")
            .try_deserialize()
            .expect("deserialize")
    }

    #[test]
    fn defaults_apply_without_sources() {
        let settings = from_toml("");

        assert!(settings.database.is_none());
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.generation.time_zone, "UTC");
        assert_eq!(settings.generation.default_window_days, 30);
        assert_eq!(settings.generation.max_instances, 1000);
    }

    #[test]
    fn file_values_override_defaults() {
        let settings = from_toml(
            r#"
            [database]
            url = "postgresql://localhost/almanac"

            [generation]
            time_zone = "America/New_York"
            default_window_days = 7
            "#,
        );

        let database = settings.database.expect("database section");
        assert_eq!(database.url, "postgresql://localhost/almanac");
        assert_eq!(database.max_connections, 4);
        assert_eq!(settings.generation.default_window_days, 7);
        assert_eq!(
            settings.generation.zone().expect("known zone"),
            chrono_tz::America::New_York
        );
    }

    #[test]
    fn unknown_zone_is_a_config_error() {
        let generation = GenerationConfig {
            time_zone: "Mars/Olympus_Mons".to_string(),
            ..GenerationConfig::default()
        };

        assert!(matches!(generation.zone(), Err(CoreError::ConfigError(_))));
    }
}
