use std::path::PathBuf;
use std::time::Duration;

use crate::common::ConfigError;
use crate::gate::{GatePolicy, DEFAULT_ACCESS_CODE};

pub const DEFAULT_GEO_URL: &str = "https://ipapi.co";

/// Startup configuration, read once from the environment (`.env` is
/// honored by the caller via dotenvy).
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub bind_addr: String,
    pub content_dir: PathBuf,
    pub geo_base_url: String,
    pub gate: GatePolicy,
}

impl SiteConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env_or("BIND_ADDR", "0.0.0.0:8080");
        let content_dir = PathBuf::from(env_or("CONTENT_DIR", "./content"));
        let geo_base_url = env_or("VERDANT_GEO_URL", DEFAULT_GEO_URL);

        let timeout_secs = match std::env::var("VERDANT_GEO_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidVar {
                var: "VERDANT_GEO_TIMEOUT_SECS",
                value: raw,
            })?,
            Err(_) => 5,
        };

        let gate = GatePolicy {
            restricted_code: env_or("VERDANT_RESTRICTED_COUNTRY", "CN"),
            restricted_name: env_or("VERDANT_RESTRICTED_COUNTRY_NAME", "China"),
            access_code: env_or("VERDANT_ACCESS_CODE", DEFAULT_ACCESS_CODE),
            lookup_timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            bind_addr,
            content_dir,
            geo_base_url,
            gate,
        })
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}
