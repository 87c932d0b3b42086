use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::core::{
    AreaCatalog, DeviceLocator, GeolocationProvider, PositionOptions, DEFAULT_RADIUS_KM,
    DEFAULT_RESULT_LIMIT,
};
use crate::models::{Coordinate, NamedLocation};
use crate::services::sessions::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub geolocation: GeolocationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Replaces the built-in popular areas when present
    #[serde(default)]
    pub areas: Option<Vec<AreaSettings>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_restaurants_table")]
    pub restaurants_table: String,
    #[serde(default = "default_history_table")]
    pub history_table: String,
    pub request_timeout_secs: Option<u64>,
}

fn default_restaurants_table() -> String { "restaurants".to_string() }
fn default_history_table() -> String { "search_history".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            result_limit: default_result_limit(),
            default_radius_km: default_radius_km(),
            history_limit: default_history_limit(),
            max_sessions: default_max_sessions(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

fn default_result_limit() -> usize { DEFAULT_RESULT_LIMIT }
fn default_radius_km() -> f64 { DEFAULT_RADIUS_KM }
fn default_history_limit() -> usize { 10 }
fn default_max_sessions() -> usize { DEFAULT_MAX_SESSIONS }
fn default_session_ttl_secs() -> u64 { DEFAULT_SESSION_TTL.as_secs() }

impl SearchSettings {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeolocationSettings {
    #[serde(default = "default_geo_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_maximum_age_secs")]
    pub maximum_age_secs: u64,
    #[serde(default = "default_true")]
    pub enable_high_accuracy: bool,
}

impl Default for GeolocationSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_geo_timeout_secs(),
            maximum_age_secs: default_maximum_age_secs(),
            enable_high_accuracy: default_true(),
        }
    }
}

impl GeolocationSettings {
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: self.enable_high_accuracy,
            timeout: Duration::from_secs(self.timeout_secs),
            maximum_age: Duration::from_secs(self.maximum_age_secs),
        }
    }
}

fn default_geo_timeout_secs() -> u64 { 10 }
fn default_maximum_age_secs() -> u64 { 300 }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct AreaSettings {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with FAMILY_DINING__)
    /// 5. SUPABASE_URL / SUPABASE_ANON_KEY for the store section
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., FAMILY_DINING__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("FAMILY_DINING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_store_env(settings)?;

        settings.try_deserialize()
    }

    /// The area table to serve, built once at startup
    pub fn area_catalog(&self) -> AreaCatalog {
        match &self.areas {
            Some(areas) if !areas.is_empty() => AreaCatalog::new(
                areas
                    .iter()
                    .map(|a| {
                        NamedLocation::new(a.name.clone(), Coordinate::new(a.latitude, a.longitude))
                    })
                    .collect(),
            ),
            _ => AreaCatalog::tokyo(),
        }
    }

    /// Device locator over a platform position source, using the
    /// configured timeout and cache age
    pub fn device_locator<P: GeolocationProvider>(&self, provider: P) -> DeviceLocator<P> {
        DeviceLocator::new(provider, self.geolocation.position_options())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.store.request_timeout_secs.unwrap_or(30))
    }
}

/// The hosted database usually hands out SUPABASE_URL / SUPABASE_ANON_KEY;
/// accept them directly on top of the prefixed variables.
fn apply_store_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("SUPABASE_URL") {
        builder = builder.set_override("store.url", url)?;
    }
    if let Ok(key) = env::var("SUPABASE_ANON_KEY") {
        builder = builder.set_override("store.api_key", key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    const MINIMAL: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8080

        [store]
        url = "https://db.test"
        api_key = "anon"
    "#;

    #[test]
    fn test_defaults() {
        let settings = from_toml(MINIMAL);

        assert_eq!(settings.search.result_limit, 20);
        assert_eq!(settings.search.default_radius_km, 10.0);
        assert_eq!(settings.search.history_limit, 10);
        assert_eq!(settings.store.restaurants_table, "restaurants");
        assert_eq!(settings.store.history_table, "search_history");
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.geolocation.position_options(), PositionOptions::default());
        assert_eq!(settings.area_catalog(), AreaCatalog::tokyo());
    }

    #[test]
    fn test_logging_and_session_sections() {
        let settings = from_toml(MINIMAL);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.logging.format, "compact");
        assert_eq!(settings.search.max_sessions, 10_000);
        assert_eq!(settings.search.session_ttl(), Duration::from_secs(1800));

        let toml = format!(
            "{}\n{}",
            MINIMAL,
            r#"
            [search]
            max_sessions = 50
            session_ttl_secs = 120

            [logging]
            level = "debug"
            format = "pretty"
            "#
        );
        let settings = from_toml(&toml);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, "pretty");
        assert_eq!(settings.search.max_sessions, 50);
        assert_eq!(settings.search.session_ttl(), Duration::from_secs(120));
        assert_eq!(settings.search.result_limit, 20);
    }

    #[test]
    fn test_device_locator_uses_geolocation_section() {
        use crate::core::{GeolocationError, PositionFix};
        use async_trait::async_trait;

        struct NoDevice;

        #[async_trait]
        impl GeolocationProvider for NoDevice {
            async fn current_position(
                &self,
                _options: &PositionOptions,
            ) -> Result<PositionFix, GeolocationError> {
                Err(GeolocationError::Unsupported)
            }
        }

        let toml = format!(
            "{}\n{}",
            MINIMAL,
            r#"
            [geolocation]
            timeout_secs = 3
            maximum_age_secs = 60
            enable_high_accuracy = false
            "#
        );
        let settings = from_toml(&toml);
        let locator = settings.device_locator(NoDevice);

        assert_eq!(locator.options().timeout, Duration::from_secs(3));
        assert_eq!(locator.options().maximum_age, Duration::from_secs(60));
        assert!(!locator.options().enable_high_accuracy);
    }

    #[test]
    fn test_custom_areas() {
        let toml = format!(
            "{}\n{}",
            MINIMAL,
            r#"
            [[areas]]
            name = "横浜駅周辺"
            latitude = 35.4658
            longitude = 139.6223
            "#
        );
        let settings = from_toml(&toml);
        let catalog = settings.area_catalog();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.match_query("横浜").unwrap().name, "横浜駅周辺");
    }
}
