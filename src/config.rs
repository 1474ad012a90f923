use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable {0} must be set")]
    Missing(&'static str),
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("FOODGRAM_PORT", "8000")?,
            database_url: require("DATABASE_URL")?,
            jwt_secret: require("FOODGRAM_JWT_SECRET")?,
            max_connections: try_load("FOODGRAM_MAX_CONNECTIONS", "5")?,
            run_migrations: try_load("FOODGRAM_RUN_MIGRATIONS", "true")?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    var(key).ok_or_else(|| {
        warn!("Environment variable {key} not found");
        ConfigError::Missing(key)
    })
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    parse(
        key,
        var(key).unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        }),
    )
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    value.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_values() {
        let port: u16 = parse("FOODGRAM_PORT", String::from(" 8080 ")).unwrap();
        assert_eq!(port, 8080);

        let migrate: bool = parse("FOODGRAM_RUN_MIGRATIONS", String::from("false")).unwrap();
        assert!(!migrate);
    }

    #[test]
    fn rejects_malformed_values() {
        let result: Result<u16, _> = parse("FOODGRAM_PORT", String::from("eighty"));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "FOODGRAM_PORT",
                ..
            })
        ));
    }

    #[test]
    fn unset_values_fall_back_to_defaults() {
        let connections: u32 =
            try_load("FOODGRAM_TEST_UNSET_MAX_CONNECTIONS", "5").unwrap();
        assert_eq!(connections, 5);
    }
}
