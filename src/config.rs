//! Environment-driven application configuration.

use crate::constants::{DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_CSV_BATCH_SIZE};
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Runtime settings for the ingestion client and persistence backend.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the analysis backend, without a trailing slash
    pub api_base_url: String,
    /// Per-request timeout for ingestion calls (native only)
    pub request_timeout_secs: u64,
    /// Batch size sent with CSV uploads
    pub csv_batch_size: u32,
    /// Directory holding the persisted buckets, when one is known
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            csv_batch_size: DEFAULT_CSV_BATCH_SIZE,
            data_dir: default_data_dir(),
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set to a value
    /// that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        build_app_config(|key| std::env::var(key), default_data_dir())
    }

    /// The bucket directory, or an error on platforms without one.
    pub fn require_data_dir(&self) -> Result<&Path, ConfigError> {
        self.data_dir.as_deref().ok_or(ConfigError::NoDataDir)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "sentiment", "sentiment-dashboard")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

#[cfg(target_arch = "wasm32")]
fn default_data_dir() -> Option<PathBuf> {
    None
}

/// Builds the configuration from an injectable variable lookup.
fn build_app_config<F>(lookup: F, fallback_data_dir: Option<PathBuf>) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let raw_url = or_default("SENTIMENT_API_URL", DEFAULT_API_BASE_URL);
    let api_base_url = raw_url.trim().trim_end_matches('/').to_string();
    reqwest::Url::parse(&api_base_url).map_err(|e| invalid("SENTIMENT_API_URL", e.to_string()))?;

    let request_timeout_secs = or_default(
        "SENTIMENT_API_TIMEOUT_SECS",
        &DEFAULT_API_TIMEOUT_SECS.to_string(),
    )
    .parse::<u64>()
    .map_err(|e| invalid("SENTIMENT_API_TIMEOUT_SECS", e.to_string()))?;

    let csv_batch_size = or_default("SENTIMENT_CSV_BATCH_SIZE", &DEFAULT_CSV_BATCH_SIZE.to_string())
        .parse::<u32>()
        .map_err(|e| invalid("SENTIMENT_CSV_BATCH_SIZE", e.to_string()))?;
    if csv_batch_size == 0 {
        return Err(invalid("SENTIMENT_CSV_BATCH_SIZE", "must be positive".into()));
    }

    let data_dir = lookup("SENTIMENT_DATA_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
        .or(fallback_data_dir);

    Ok(AppConfig {
        api_base_url,
        request_timeout_secs,
        csv_batch_size,
        data_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env::VarError;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| map.get(key).map(|v| (*v).to_string()).ok_or(VarError::NotPresent)
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let map = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map), None).unwrap();
        assert_eq!(cfg.api_base_url, "http://localhost:8000");
        assert_eq!(cfg.request_timeout_secs, 120);
        assert_eq!(cfg.csv_batch_size, 32);
        assert!(cfg.data_dir.is_none());
        assert!(matches!(cfg.require_data_dir(), Err(ConfigError::NoDataDir)));
    }

    #[test]
    fn overrides_are_parsed_and_trailing_slash_dropped() {
        let mut map = HashMap::new();
        map.insert("SENTIMENT_API_URL", "https://api.example.com/");
        map.insert("SENTIMENT_API_TIMEOUT_SECS", "30");
        map.insert("SENTIMENT_DATA_DIR", "/tmp/dashboard");
        let cfg = build_app_config(lookup_from_map(&map), Some(PathBuf::from("/unused"))).unwrap();
        assert_eq!(cfg.api_base_url, "https://api.example.com");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.require_data_dir().unwrap(), Path::new("/tmp/dashboard"));
    }

    #[test]
    fn invalid_timeout_is_reported() {
        let mut map = HashMap::new();
        map.insert("SENTIMENT_API_TIMEOUT_SECS", "soon");
        let result = build_app_config(lookup_from_map(&map), None);
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SENTIMENT_API_TIMEOUT_SECS"),
            "got: {result:?}"
        );
    }

    #[test]
    fn invalid_url_is_reported() {
        let mut map = HashMap::new();
        map.insert("SENTIMENT_API_URL", "not a url");
        let result = build_app_config(lookup_from_map(&map), None);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SENTIMENT_API_URL"));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut map = HashMap::new();
        map.insert("SENTIMENT_CSV_BATCH_SIZE", "0");
        assert!(build_app_config(lookup_from_map(&map), None).is_err());
    }
}
