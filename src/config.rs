//! Application configuration loaded from environment variables.
//!
//! Everything except the JWT signing key has a sensible default so the
//! service can run locally against the public Soil Data Access endpoint.

use std::env;

/// Public USDA Soil Data Access tabular endpoint.
pub const DEFAULT_SDA_URL: &str = "https://SDMDataAccess.sc.egov.usda.gov/Tabular/post.rest";

/// Upstream query timeout.
pub const DEFAULT_SDA_TIMEOUT_SECS: u64 = 30;

/// Soil survey data changes on the order of years.
pub const DEFAULT_SOIL_CACHE_TTL_DAYS: i64 = 7;

const DEFAULT_CACHE_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

/// Where soil summaries are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    /// In-process map; lost on restart.
    Memory,
    /// Firestore collection shared across instances.
    Firestore,
}

impl std::str::FromStr for CacheBackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackendKind::Memory),
            "firestore" => Ok(CacheBackendKind::Firestore),
            _ => Err(ConfigError::Invalid("SOIL_CACHE_BACKEND")),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore cache backend)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key shared with the session issuer (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Soil Data Access tabular query endpoint
    pub sda_url: String,
    /// Hard timeout for a single SDA query
    pub sda_timeout_secs: u64,
    /// Lifetime of a cached soil summary
    pub soil_cache_ttl_days: i64,
    /// Cache storage backend
    pub cache_backend: CacheBackendKind,
    /// Interval between expired-entry sweeps
    pub cache_sweep_interval_secs: u64,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            sda_url: "http://127.0.0.1:9/Tabular/post.rest".to_string(),
            sda_timeout_secs: DEFAULT_SDA_TIMEOUT_SECS,
            soil_cache_ttl_days: DEFAULT_SOIL_CACHE_TTL_DAYS,
            cache_backend: CacheBackendKind::Memory,
            cache_sweep_interval_secs: DEFAULT_CACHE_SWEEP_INTERVAL_SECS,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            sda_url: env::var("SDA_URL").unwrap_or_else(|_| DEFAULT_SDA_URL.to_string()),
            sda_timeout_secs: parse_or("SDA_TIMEOUT_SECS", DEFAULT_SDA_TIMEOUT_SECS)?,
            soil_cache_ttl_days: parse_or("SOIL_CACHE_TTL_DAYS", DEFAULT_SOIL_CACHE_TTL_DAYS)?,
            cache_backend: match env::var("SOIL_CACHE_BACKEND") {
                Ok(v) => v.parse()?,
                Err(_) => CacheBackendKind::Memory,
            },
            cache_sweep_interval_secs: parse_or(
                "CACHE_SWEEP_INTERVAL_SECS",
                DEFAULT_CACHE_SWEEP_INTERVAL_SECS,
            )?,
        })
    }

    /// Cache TTL as a chrono duration.
    pub fn soil_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.soil_cache_ttl_days)
    }
}

/// Parse an optional numeric variable, rejecting values that are present but malformed.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
