//! Configuration management
//!
//! The pipeline takes an explicit [`IngestConfig`]. Values come from built-in
//! defaults, then a `.env` file and environment variables, then CLI flags.

use rir_common::{Result, RirError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Ingestion Configuration Constants
// ============================================================================

/// Canonical delegated-extended statistics files of the five registries.
pub const DEFAULT_SOURCES: [&str; 5] = [
    "https://ftp.apnic.net/stats/afrinic/delegated-afrinic-extended-latest",
    "https://ftp.apnic.net/stats/apnic/delegated-apnic-extended-latest",
    "https://ftp.arin.net/pub/stats/arin/delegated-arin-extended-latest",
    "https://ftp.lacnic.net/pub/stats/lacnic/delegated-lacnic-extended-latest",
    "https://ftp.ripe.net/ripe/stats/delegated-ripencc-extended-latest",
];

/// Default artifact base path; `.sql` and `.db` are appended.
pub const DEFAULT_DEST: &str = "dist/delegated-registry-extended-latest";

/// Default attempts per URL.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay after the first failed attempt, in milliseconds.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 100;

/// Default growth factor between retry delays.
pub const DEFAULT_BACKOFF_MULTIPLIER: u32 = 2;

/// Default connection-establishment timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Exponential backoff settings for one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.initial_delay_ms).saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_BACKOFF_MS,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

/// Configuration for one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Statistics file URLs, each containing the token `latest`
    pub sources: Vec<String>,

    /// Artifact base path
    pub dest: PathBuf,

    pub retry: RetryPolicy,

    pub connect_timeout_secs: u64,

    /// Fail instead of letting the fresher registry win a duplicated resource
    pub strict_conflicts: bool,

    /// Delete the intermediate database once the dump is written
    pub remove_database: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            sources: DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            dest: PathBuf::from(DEFAULT_DEST),
            retry: RetryPolicy::default(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            strict_conflicts: false,
            remove_database: false,
        }
    }
}

impl IngestConfig {
    /// Load configuration from `.env` and the process environment
    ///
    /// Environment variables:
    /// - `RIR_SOURCES`: comma-separated source URLs
    /// - `RIR_DEST`: artifact base path
    /// - `RIR_MAX_ATTEMPTS`: attempts per URL
    /// - `RIR_INITIAL_BACKOFF_MS`: first retry delay
    /// - `RIR_CONNECT_TIMEOUT_SECS`: connection timeout
    /// - `RIR_STRICT_CONFLICTS`: true/false
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(sources) = lookup("RIR_SOURCES") {
            config.sources = sources
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(dest) = lookup("RIR_DEST") {
            config.dest = PathBuf::from(dest);
        }

        if let Some(attempts) = parse_var(&lookup, "RIR_MAX_ATTEMPTS")? {
            config.retry.max_attempts = attempts;
        }

        if let Some(delay) = parse_var(&lookup, "RIR_INITIAL_BACKOFF_MS")? {
            config.retry.initial_delay_ms = delay;
        }

        if let Some(timeout) = parse_var(&lookup, "RIR_CONNECT_TIMEOUT_SECS")? {
            config.connect_timeout_secs = timeout;
        }

        if let Some(strict) = parse_var(&lookup, "RIR_STRICT_CONFLICTS")? {
            config.strict_conflicts = strict;
        }

        Ok(config)
    }

    /// Create new config with builder pattern
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Path of the SQL dump artifact
    pub fn dump_path(&self) -> PathBuf {
        self.dest_with_suffix(".sql")
    }

    /// Path of the intermediate SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.dest_with_suffix(".db")
    }

    fn dest_with_suffix(&self, suffix: &str) -> PathBuf {
        let mut path = self.dest.clone().into_os_string();
        path.push(suffix);
        PathBuf::from(path)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(RirError::config("At least one source URL is required"));
        }

        if let Some(blank) = self.sources.iter().position(|s| s.trim().is_empty()) {
            return Err(RirError::config(format!("Source URL #{} is blank", blank + 1)));
        }

        if self.dest.file_name().is_none() {
            return Err(RirError::config(format!(
                "Destination '{}' must name a file",
                self.dest.display()
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(RirError::config("max_attempts must be greater than 0"));
        }

        if self.connect_timeout_secs == 0 {
            return Err(RirError::config("Connect timeout must be greater than 0"));
        }

        Ok(())
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| RirError::config(format!("{key} has an invalid value: '{raw}'"))),
    }
}

/// Builder for IngestConfig
#[derive(Debug, Default)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn dest(mut self, dest: impl Into<PathBuf>) -> Self {
        self.config.dest = dest.into();
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts;
        self
    }

    pub fn initial_backoff(mut self, delay: Duration) -> Self {
        self.config.retry.initial_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs;
        self
    }

    pub fn strict_conflicts(mut self, strict: bool) -> Self {
        self.config.strict_conflicts = strict;
        self
    }

    pub fn remove_database(mut self, remove: bool) -> Self {
        self.config.remove_database = remove;
        self
    }

    pub fn build(self) -> IngestConfig {
        self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.sources.len(), 5);
        assert!(config.sources.iter().all(|s| s.ends_with("-latest")));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.dump_path(), PathBuf::from("dist/delegated-registry-extended-latest.sql"));
        assert_eq!(config.database_path(), PathBuf::from("dist/delegated-registry-extended-latest.db"));
        config.validate().unwrap();
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = IngestConfig::from_lookup(lookup(&[
            ("RIR_SOURCES", "http://a/x-latest, http://b/y-latest,"),
            ("RIR_DEST", "/tmp/out/registry"),
            ("RIR_MAX_ATTEMPTS", "5"),
            ("RIR_INITIAL_BACKOFF_MS", "1"),
            ("RIR_STRICT_CONFLICTS", "true"),
        ]))
        .unwrap();

        assert_eq!(config.sources, vec!["http://a/x-latest", "http://b/y-latest"]);
        assert_eq!(config.dest, PathBuf::from("/tmp/out/registry"));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay_ms, 1);
        assert!(config.strict_conflicts);
    }

    #[test]
    fn test_from_lookup_rejects_garbage_numbers() {
        let err = IngestConfig::from_lookup(lookup(&[("RIR_MAX_ATTEMPTS", "three")])).unwrap_err();
        assert!(err.to_string().contains("RIR_MAX_ATTEMPTS"));
    }

    #[test]
    fn test_validate() {
        assert!(IngestConfig::builder().sources(Vec::<String>::new()).build().validate().is_err());
        assert!(IngestConfig::builder().sources([" "]).build().validate().is_err());
        assert!(IngestConfig::builder().max_attempts(0).build().validate().is_err());
        assert!(IngestConfig::builder().dest("/").build().validate().is_err());
        assert!(IngestConfig::builder().connect_timeout_secs(0).build().validate().is_err());
    }

    #[test]
    fn test_retry_delays_grow_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
    }
}
