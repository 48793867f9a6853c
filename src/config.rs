// Runtime configuration read from the environment (and `.env` when present).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::ConfigError;
use crate::generator::{
    GeneratorLimits, DEFAULT_MAX_COURSES, MAX_INPUT_COURSES, MAX_SCHEDULES_TO_GENERATE,
    MAX_SCHEDULES_TO_RETURN,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// Terms loaded into the catalog at startup.
    pub active_terms: Vec<String>,
    pub cors_allowed_origins: Vec<String>,
    pub generate_timeout: Duration,
    pub max_input_courses: usize,
    pub limits: GeneratorLimits,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: PathBuf::from("data/schedule.db"),
            active_terms: Vec::new(),
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            generate_timeout: Duration::from_millis(10_000),
            max_input_courses: MAX_INPUT_COURSES,
            limits: GeneratorLimits {
                generate_cap: MAX_SCHEDULES_TO_GENERATE,
                response_cap: MAX_SCHEDULES_TO_RETURN,
                default_max_courses: DEFAULT_MAX_COURSES,
            },
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        info!(
            host = %config.host,
            port = config.port,
            database_path = %config.database_path.display(),
            active_terms = ?config.active_terms,
            timeout_ms = config.generate_timeout.as_millis() as u64,
            generate_cap = config.limits.generate_cap,
            response_cap = config.limits.response_cap,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Builds the config from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let list = |key: &str, default: Vec<String>| -> Vec<String> {
            match get(key) {
                Some(v) => v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
                None => default,
            }
        };

        Ok(Config {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            database_path: get("DATABASE_PATH").map(PathBuf::from).unwrap_or(defaults.database_path),
            active_terms: list("ACTIVE_TERMS", defaults.active_terms),
            cors_allowed_origins: list("CORS_ALLOWED_ORIGINS", defaults.cors_allowed_origins),
            generate_timeout: Duration::from_millis(parse_or(
                get("GENERATE_TIMEOUT_MS"),
                "GENERATE_TIMEOUT_MS",
                defaults.generate_timeout.as_millis() as u64,
            )?),
            max_input_courses: parse_or(get("MAX_INPUT_COURSES"), "MAX_INPUT_COURSES", defaults.max_input_courses)?,
            limits: GeneratorLimits {
                generate_cap: parse_or(
                    get("MAX_SCHEDULES_TO_GENERATE"),
                    "MAX_SCHEDULES_TO_GENERATE",
                    defaults.limits.generate_cap,
                )?,
                response_cap: parse_or(
                    get("MAX_SCHEDULES_TO_RETURN"),
                    "MAX_SCHEDULES_TO_RETURN",
                    defaults.limits.response_cap,
                )?,
                default_max_courses: defaults.limits.default_max_courses,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue { key, value: v }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = from_map(&[]).expect("defaults");
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn reads_overrides() {
        let cfg = from_map(&[
            ("PORT", "9000"),
            ("ACTIVE_TERMS", "202510, 202520,,"),
            ("GENERATE_TIMEOUT_MS", "2500"),
            ("MAX_SCHEDULES_TO_RETURN", "50"),
            ("HOST", "  "),
        ])
        .expect("config");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.active_terms, vec!["202510", "202520"]);
        assert_eq!(cfg.generate_timeout, Duration::from_millis(2500));
        assert_eq!(cfg.limits.response_cap, 50);
        assert_eq!(cfg.limits.generate_cap, MAX_SCHEDULES_TO_GENERATE);
    }

    #[test]
    fn rejects_bad_numbers() {
        match from_map(&[("PORT", "eighty")]) {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, "PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }
}
