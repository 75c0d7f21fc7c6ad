use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

pub const DEFAULT_LEDGER_BUFFER: usize = 32;

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryConfig {
    /// Capacity of the ledger's request channel
    pub ledger_buffer: usize,
    /// How long checkout and return wait for a contended book; `None` waits indefinitely
    pub guard_timeout: Option<Duration>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            ledger_buffer: DEFAULT_LEDGER_BUFFER,
            guard_timeout: None,
        }
    }
}

impl LibraryConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Missing keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let ledger_buffer = match lookup("LIBRARY_LEDGER_BUFFER") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .context("LIBRARY_LEDGER_BUFFER must be a positive number")?,
            None => DEFAULT_LEDGER_BUFFER,
        };

        let guard_timeout = match lookup("LIBRARY_GUARD_TIMEOUT_MS") {
            Some(value) => {
                let millis: u64 = value
                    .trim()
                    .parse()
                    .context("LIBRARY_GUARD_TIMEOUT_MS must be a number of milliseconds")?;
                (millis > 0).then(|| Duration::from_millis(millis))
            }
            None => None,
        };

        Ok(Self {
            ledger_buffer,
            guard_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = LibraryConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, LibraryConfig::default());
    }

    #[test]
    fn test_reads_values() {
        let config = LibraryConfig::from_lookup(lookup(&[
            ("LIBRARY_LEDGER_BUFFER", "128"),
            ("LIBRARY_GUARD_TIMEOUT_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.ledger_buffer, 128);
        assert_eq!(config.guard_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_zero_timeout_means_wait_forever() {
        let config = LibraryConfig::from_lookup(lookup(&[("LIBRARY_GUARD_TIMEOUT_MS", "0")])).unwrap();
        assert_eq!(config.guard_timeout, None);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(LibraryConfig::from_lookup(lookup(&[("LIBRARY_LEDGER_BUFFER", "0")])).is_err());
        assert!(LibraryConfig::from_lookup(lookup(&[("LIBRARY_LEDGER_BUFFER", "lots")])).is_err());
        assert!(LibraryConfig::from_lookup(lookup(&[("LIBRARY_GUARD_TIMEOUT_MS", "-5")])).is_err());
    }
}
