use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::{DEFAULT_MAX_RESULTS, DEFAULT_MIN_SCORE};
use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub explainer: ExplainerSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

/// Policy store; the service runs on the built-in catalog when `url` is unset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

impl DatabaseSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs.unwrap_or(5))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.unwrap_or(600))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub redis_url: Option<String>,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_l1_cache_size")]
    pub l1_cache_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl_secs: default_ttl_secs(),
            l1_cache_size: default_l1_cache_size(),
        }
    }
}

fn default_ttl_secs() -> u64 { 300 }
fn default_l1_cache_size() -> u64 { 1000 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_min_score")]
    pub default_min_score: f64,
    #[serde(default = "default_max_results")]
    pub default_max_results: i64,
    #[serde(default = "default_max_results_cap")]
    pub max_results_cap: i64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_min_score: default_min_score(),
            default_max_results: default_max_results(),
            max_results_cap: default_max_results_cap(),
        }
    }
}

impl MatchingSettings {
    /// Resolve request overrides against the configured defaults and cap
    pub fn resolve(&self, min_score: Option<f64>, max_results: Option<i64>) -> (f64, i64) {
        let min_score = min_score.unwrap_or(self.default_min_score);
        let max_results = max_results
            .unwrap_or(self.default_max_results)
            .min(self.max_results_cap);
        (min_score, max_results)
    }
}

fn default_min_score() -> f64 { DEFAULT_MIN_SCORE }
fn default_max_results() -> i64 { DEFAULT_MAX_RESULTS }
fn default_max_results_cap() -> i64 { 50 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_age_weight")]
    pub age: f64,
    #[serde(default = "default_region_weight")]
    pub region: f64,
    #[serde(default = "default_employment_weight")]
    pub employment: f64,
    #[serde(default = "default_income_weight")]
    pub income: f64,
    #[serde(default = "default_interest_weight")]
    pub interest: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            age: default_age_weight(),
            region: default_region_weight(),
            employment: default_employment_weight(),
            income: default_income_weight(),
            interest: default_interest_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(value: &WeightsConfig) -> Self {
        ScoringWeights {
            age: value.age,
            region: value.region,
            employment: value.employment,
            income: value.income,
            interest: value.interest,
        }
    }
}

fn default_age_weight() -> f64 { 30.0 }
fn default_region_weight() -> f64 { 20.0 }
fn default_employment_weight() -> f64 { 20.0 }
fn default_income_weight() -> f64 { 15.0 }
fn default_interest_weight() -> f64 { 15.0 }

/// Explanation service; template explanations are used when `endpoint` is unset
#[derive(Debug, Clone, Deserialize)]
pub struct ExplainerSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_explainer_model")]
    pub model: String,
    #[serde(default = "default_explainer_timeout")]
    pub timeout_secs: u64,
}

impl Default for ExplainerSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: default_explainer_model(),
            timeout_secs: default_explainer_timeout(),
        }
    }
}

fn default_explainer_model() -> String { "gpt-4o-mini".to_string() }
fn default_explainer_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_block_secs")]
    pub block_secs: u64,
    #[serde(default = "default_tracked_clients")]
    pub tracked_clients: usize,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            block_secs: default_block_secs(),
            tracked_clients: default_tracked_clients(),
        }
    }
}

fn default_max_requests() -> usize { 100 }
fn default_window_secs() -> u64 { 60 }
fn default_block_secs() -> u64 { 300 }
fn default_tracked_clients() -> usize { 10_000 }

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

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration files (config/default.toml, config/local.toml)
    /// 3. Environment variables (prefixed with YOUTH__)
    /// 4. DATABASE_URL, REDIS_URL and OPENAI_API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., YOUTH__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        apply_env_overrides(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        apply_env_overrides(settings)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("YOUTH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply the conventional unprefixed variables on top of loaded settings
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("DATABASE_URL", "database.url"),
        ("REDIS_URL", "cache.redis_url"),
        ("OPENAI_API_KEY", "explainer.api_key"),
    ];

    let mut builder = Config::builder().add_source(settings);
    for (var, key) in overrides {
        if let Some(value) = env::var(var).ok().filter(|v| !v.trim().is_empty()) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = ScoringWeights::from(&WeightsConfig::default());
        assert_eq!(weights, ScoringWeights::default());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str("", config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 8000);
        assert!(settings.database.url.is_none());
        assert!(settings.cache.redis_url.is_none());
        assert_eq!(settings.matching.default_min_score, 40.0);
        assert_eq!(settings.matching.default_max_results, 10);
        assert_eq!(settings.rate_limit.max_requests, 100);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_partial_section() {
        let toml = r#"
            [scoring.weights]
            age = 40.0

            [matching]
            max_results_cap = 20
        "#;
        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.scoring.weights.age, 40.0);
        assert_eq!(settings.scoring.weights.region, 20.0);
        assert_eq!(settings.matching.max_results_cap, 20);
        assert_eq!(settings.matching.default_min_score, 40.0);
    }

    #[test]
    fn test_database_timeouts() {
        let defaults = DatabaseSettings::default();
        assert_eq!(defaults.acquire_timeout(), Duration::from_secs(5));
        assert_eq!(defaults.idle_timeout(), Duration::from_secs(600));

        let toml = r#"
            [database]
            acquire_timeout_secs = 2
            idle_timeout_secs = 30
        "#;
        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.database.acquire_timeout(), Duration::from_secs(2));
        assert_eq!(settings.database.idle_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_matching_resolve() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.resolve(None, None), (40.0, 10));
        assert_eq!(matching.resolve(Some(70.0), Some(3)), (70.0, 3));
        assert_eq!(matching.resolve(None, Some(500)), (40.0, 50));
        assert_eq!(matching.resolve(None, Some(-1)), (40.0, -1));
    }
}
