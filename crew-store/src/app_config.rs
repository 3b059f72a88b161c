use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Json,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    pub crew_file: String,
    pub schedule_file: String,
}

fn default_backend() -> StorageBackend { StorageBackend::Json }

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_hold_ttl_seconds")]
    pub hold_ttl_seconds: u32,
}

/// Longest hold a deployment may configure (one day).
pub const MAX_HOLD_TTL_SECONDS: u32 = 24 * 60 * 60;

fn default_hold_ttl_seconds() -> u32 { crew_core::DEFAULT_HOLD_TTL_SECONDS }

impl Default for BusinessRules {
    fn default() -> Self {
        Self { hold_ttl_seconds: default_hold_ttl_seconds() }
    }
}

impl BusinessRules {
    pub fn hold_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.hold_ttl_seconds))
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if !(1..=MAX_HOLD_TTL_SECONDS).contains(&self.hold_ttl_seconds) {
            return Err(config::ConfigError::Message(format!(
                "business_rules.hold_ttl_seconds must be between 1 and {}, got {}",
                MAX_HOLD_TTL_SECONDS, self.hold_ttl_seconds
            )));
        }
        Ok(())
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `CREW_SERVER__PORT=9000` overrides `server.port`
            .add_source(config::Environment::with_prefix("CREW").separator("__"))
            .build()?;

        Self::validated(s.try_deserialize()?)
    }

    pub fn from_toml(contents: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .and_then(Self::validated)
    }

    fn validated(config: Self) -> Result<Self, config::ConfigError> {
        config.business_rules.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_business_rules() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 8080

            [storage]
            crew_file = "data/crew.json"
            schedule_file = "data/schedule.json"
            "#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.business_rules.hold_ttl(), chrono::Duration::minutes(10));
    }

    #[test]
    fn test_memory_backend_and_custom_ttl() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 3000

            [storage]
            backend = "memory"
            crew_file = "crew.json"
            schedule_file = "schedule.json"

            [business_rules]
            hold_ttl_seconds = 120
            "#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.business_rules.hold_ttl_seconds, 120);
    }

    fn with_ttl(ttl: &str) -> Result<Config, config::ConfigError> {
        Config::from_toml(&format!(
            r#"
            [server]
            port = 8080

            [storage]
            crew_file = "crew.json"
            schedule_file = "schedule.json"

            [business_rules]
            hold_ttl_seconds = {}
            "#,
            ttl
        ))
    }

    #[test]
    fn test_hold_ttl_out_of_range_is_rejected() {
        assert!(with_ttl("0").is_err());
        assert!(with_ttl("-30").is_err());
        assert!(with_ttl("86401").is_err());
        assert!(with_ttl("9223372036854775807").is_err());

        let config = with_ttl("86400").expect("One day is allowed");
        assert_eq!(config.business_rules.hold_ttl(), chrono::Duration::days(1));
    }
}
