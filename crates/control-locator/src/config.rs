//! Locator configuration

use crate::errors::LocatorError;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

/// Tunables for parsing, matching and the async surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Separator between path fragments
    pub path_separator: char,

    /// Number of visible elements from which matching fans out on rayon
    pub parallel_threshold: usize,

    /// Capacity of the compiled pattern cache
    pub pattern_cache_capacity: usize,

    /// Upper bound for one locate call
    pub locate_timeout_ms: Option<u64>,

    /// Log a warning when several controls share the best found type
    pub warn_on_ambiguous: bool,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            path_separator: '>',
            parallel_threshold: 64,
            pattern_cache_capacity: 256,
            locate_timeout_ms: None,
            warn_on_ambiguous: true,
        }
    }
}

impl LocatorConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, LocatorError> {
        let config: LocatorConfig =
            serde_json::from_str(json).map_err(|e| LocatorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `LOCATOR_*` environment variables on the defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            path_separator: parse_char_env("LOCATOR_PATH_SEPARATOR", defaults.path_separator),
            parallel_threshold: parse_usize_env(
                "LOCATOR_PARALLEL_THRESHOLD",
                defaults.parallel_threshold,
            ),
            pattern_cache_capacity: parse_usize_env(
                "LOCATOR_PATTERN_CACHE_CAPACITY",
                defaults.pattern_cache_capacity,
            ),
            locate_timeout_ms: parse_timeout_env("LOCATOR_TIMEOUT_MS"),
            warn_on_ambiguous: parse_bool_env("LOCATOR_WARN_ON_AMBIGUOUS", defaults.warn_on_ambiguous),
        };
        match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("Ignoring locator environment overrides: {}", e);
                defaults
            }
        }
    }

    pub fn validate(&self) -> Result<(), LocatorError> {
        if self.path_separator.is_whitespace()
            || matches!(self.path_separator, '[' | ']' | '\\' | ';')
        {
            return Err(LocatorError::Config(format!(
                "'{}' cannot be used as path separator",
                self.path_separator
            )));
        }
        if self.pattern_cache_capacity == 0 {
            return Err(LocatorError::Config(
                "pattern_cache_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn locate_timeout(&self) -> Option<Duration> {
        self.locate_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_path_separator(mut self, separator: char) -> Self {
        self.path_separator = separator;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn with_locate_timeout(mut self, timeout: Duration) -> Self {
        self.locate_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }
}

fn parse_bool_env(var: &str, default: bool) -> bool {
    match env::var(var) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            other => {
                warn!("{} has unparsable value '{}', using {}", var, other, default);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_usize_env(var: &str, default: usize) -> usize {
    match env::var(var) {
        Ok(value) => value.trim().parse::<usize>().unwrap_or_else(|_| {
            warn!("{} has unparsable value '{}', using {}", var, value, default);
            default
        }),
        Err(_) => default,
    }
}

fn parse_char_env(var: &str, default: char) -> char {
    match env::var(var) {
        Ok(value) => {
            let mut chars = value.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    warn!("{} must be a single character, using '{}'", var, default);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

fn parse_timeout_env(var: &str) -> Option<u64> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .or_else(|| {
                warn!("{} has unparsable value '{}', no timeout applied", var, value);
                None
            }),
        Err(_) => None,
    }
}
