//! Configuration file support for DevInsight
//!
//! Loads client configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.devinsightrc.json` in the working directory
//! 3. `devinsight.config.json` in the working directory
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::controller::ControllerSettings;
use crate::debounce::DebouncePolicy;
use crate::fetch::{DatasetParams, HotspotParams};
use crate::filter::PageLimit;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Service address used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

const DEFAULT_DEBOUNCE_MS: u64 = 300;
const MAX_DEBOUNCE_MS: u64 = 5000;

/// DevInsight configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevInsightConfig {
    /// Metrics service address (default: http://127.0.0.1:8000)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Rows per page, one of 10, 25, 50, 100 (default: 10)
    #[serde(default)]
    pub page_size: Option<u32>,

    /// Quiet window after a filter edit before reloading, 0 reloads on every edit (default: 300)
    #[serde(default)]
    pub debounce_ms: Option<u64>,

    /// Request timeout; unset means no client-side timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Thresholds sent with hotspot requests
    #[serde(default)]
    pub hotspots: Option<HotspotConfig>,
}

/// Hotspot query thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HotspotConfig {
    /// Minimum commits for a file to qualify (default: 5)
    pub churn_threshold: Option<u32>,
    /// Minimum complexity for a file to qualify (default: 5.0)
    pub complexity_threshold: Option<f64>,
    /// Riskiest files the service ranks before paging (default: 10000)
    pub top_n: Option<u32>,
}

/// Resolved configuration ready for use
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub limit: PageLimit,
    #[serde(rename = "debounce_ms", serialize_with = "serialize_debounce")]
    pub debounce: DebouncePolicy,
    #[serde(rename = "timeout_secs", serialize_with = "serialize_timeout")]
    pub timeout: Option<Duration>,
    #[serde(rename = "hotspots", serialize_with = "serialize_params")]
    pub params: DatasetParams,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl DevInsightConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref url) = self.base_url {
            let url = url.trim();
            if url.is_empty() {
                anyhow::bail!("base_url must not be empty");
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("base_url must start with http:// or https:// (got {})", url);
            }
        }

        if let Some(size) = self.page_size {
            PageLimit::try_from(size).map_err(|e| anyhow::anyhow!("page_size: {}", e))?;
        }

        if let Some(ms) = self.debounce_ms {
            if ms > MAX_DEBOUNCE_MS {
                anyhow::bail!(
                    "debounce_ms must be at most {} (got {})",
                    MAX_DEBOUNCE_MS,
                    ms
                );
            }
        }

        if self.timeout_secs == Some(0) {
            anyhow::bail!("timeout_secs must be positive (got 0)");
        }

        if let Some(ref h) = self.hotspots {
            if let Some(threshold) = h.complexity_threshold {
                if !threshold.is_finite() || threshold < 0.0 {
                    anyhow::bail!(
                        "hotspots.complexity_threshold must be non-negative (got {})",
                        threshold
                    );
                }
            }
            if h.top_n == Some(0) {
                anyhow::bail!("hotspots.top_n must be positive (got 0)");
            }
        }

        Ok(())
    }

    /// Resolve config into the form the client consumes
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let limit = match self.page_size {
            Some(size) => PageLimit::try_from(size).map_err(anyhow::Error::msg)?,
            None => PageLimit::default(),
        };

        let defaults = HotspotParams::default();
        let hotspots = match &self.hotspots {
            Some(h) => HotspotParams {
                churn_threshold: h.churn_threshold.unwrap_or(defaults.churn_threshold),
                complexity_threshold: h
                    .complexity_threshold
                    .unwrap_or(defaults.complexity_threshold),
                top_n: h.top_n.unwrap_or(defaults.top_n),
            },
            None => defaults,
        };

        Ok(ResolvedConfig {
            base_url: self
                .base_url
                .as_deref()
                .map(str::trim)
                .unwrap_or(DEFAULT_BASE_URL)
                .to_string(),
            limit,
            debounce: DebouncePolicy::new(Duration::from_millis(
                self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS),
            )),
            timeout: self.timeout_secs.map(Duration::from_secs),
            params: DatasetParams { hotspots },
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        DevInsightConfig::default().resolve()
    }

    /// Settings for a dashboard controller
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            limit: self.limit,
            params: self.params,
            debounce: self.debounce,
        }
    }
}

fn serialize_debounce<S: serde::Serializer>(
    policy: &DebouncePolicy,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(policy.window().as_millis() as u64)
}

fn serialize_timeout<S: serde::Serializer>(
    timeout: &Option<Duration>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match timeout {
        Some(t) => serializer.serialize_some(&t.as_secs()),
        None => serializer.serialize_none(),
    }
}

fn serialize_params<S: serde::Serializer>(
    params: &DatasetParams,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    params.hotspots.serialize(serializer)
}

/// Discover and load a config file from a directory
///
/// Search order:
/// 1. `.devinsightrc.json`
/// 2. `devinsight.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(dir: &Path) -> Result<Option<(DevInsightConfig, PathBuf)>> {
    for name in [".devinsightrc.json", "devinsight.config.json"] {
        let path = dir.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<DevInsightConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: DevInsightConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config in `dir`.
/// Returns default config if nothing is found.
pub fn load_and_resolve(dir: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(dir)? {
            Some((config, path)) => (config, Some(path)),
            None => (DevInsightConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = DevInsightConfig::default();
        config.validate().expect("default config should be valid");
        let resolved = config.resolve().expect("default config should resolve");
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.limit, PageLimit::Ten);
        assert_eq!(resolved.debounce.window(), Duration::from_millis(300));
        assert_eq!(resolved.timeout, None);
        assert_eq!(resolved.params.hotspots, HotspotParams::default());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: DevInsightConfig = serde_json::from_str("{}").unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "base_url": "https://metrics.internal:9000/api",
            "page_size": 50,
            "debounce_ms": 0,
            "timeout_secs": 15,
            "hotspots": {
                "churn_threshold": 10,
                "complexity_threshold": 7.5,
                "top_n": 500
            }
        }"#;
        let config: DevInsightConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.base_url, "https://metrics.internal:9000/api");
        assert_eq!(resolved.limit, PageLimit::Fifty);
        assert!(resolved.debounce.is_immediate());
        assert_eq!(resolved.timeout, Some(Duration::from_secs(15)));
        assert_eq!(resolved.params.hotspots.churn_threshold, 10);
        assert_eq!(resolved.params.hotspots.complexity_threshold, 7.5);
        assert_eq!(resolved.params.hotspots.top_n, 500);
    }

    #[test]
    fn test_partial_hotspots_use_defaults_for_rest() {
        let json = r#"{"hotspots": {"top_n": 20}}"#;
        let config: DevInsightConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.params.hotspots.churn_threshold, 5); // default
        assert_eq!(resolved.params.hotspots.complexity_threshold, 5.0); // default
        assert_eq!(resolved.params.hotspots.top_n, 20);
    }

    #[test]
    fn test_reject_unknown_fields() {
        let result: Result<DevInsightConfig, _> = serde_json::from_str(r#"{"page": 2}"#);
        assert!(result.is_err(), "unknown fields should be rejected");
        let result: Result<DevInsightConfig, _> =
            serde_json::from_str(r#"{"hotspots": {"min_risk": 2}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_reject_unsupported_page_size() {
        let config: DevInsightConfig = serde_json::from_str(r#"{"page_size": 20}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_reject_bad_base_url() {
        for url in [r#""""#, r#""   ""#, r#""ftp://example.com""#] {
            let json = format!(r#"{{"base_url": {}}}"#, url);
            let config: DevInsightConfig = serde_json::from_str(&json).unwrap();
            assert!(config.validate().is_err(), "base_url {} should fail", url);
        }
    }

    #[test]
    fn test_reject_out_of_range_values() {
        for json in [
            r#"{"debounce_ms": 5001}"#,
            r#"{"timeout_secs": 0}"#,
            r#"{"hotspots": {"complexity_threshold": -1.0}}"#,
            r#"{"hotspots": {"top_n": 0}}"#,
        ] {
            let config: DevInsightConfig = serde_json::from_str(json).unwrap();
            assert!(config.validate().is_err(), "{} should fail", json);
        }
    }

    #[test]
    fn test_discover_devinsightrc() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".devinsightrc.json");
        fs::write(&config_path, r#"{"page_size": 25}"#).unwrap();

        let (config, path) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.page_size, Some(25));
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".devinsightrc.json"), r#"{"page_size": 25}"#).unwrap();
        fs::write(
            dir.path().join("devinsight.config.json"),
            r#"{"page_size": 100}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(
            config.page_size,
            Some(25),
            ".devinsightrc.json should take priority"
        );
    }

    #[test]
    fn test_discover_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("devinsight.config.json"), "{ not json").unwrap();
        assert!(discover_config(dir.path()).is_err());
    }

    #[test]
    fn test_no_config_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_and_resolve_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert!(resolved.config_path.is_none());
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_load_and_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".devinsightrc.json"), r#"{"page_size": 25}"#).unwrap();
        let config_path = dir.path().join("custom.json");
        fs::write(&config_path, r#"{"page_size": 100}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), Some(&config_path)).unwrap();
        assert_eq!(resolved.limit, PageLimit::Hundred);
        assert_eq!(resolved.config_path, Some(config_path));
    }

    #[test]
    fn test_resolved_config_serializes_flat() {
        let resolved = ResolvedConfig::defaults().unwrap();
        let value = serde_json::to_value(&resolved).unwrap();
        assert_eq!(value["base_url"], DEFAULT_BASE_URL);
        assert_eq!(value["limit"], 10);
        assert_eq!(value["debounce_ms"], 300);
        assert!(value["timeout_secs"].is_null());
        assert_eq!(value["hotspots"]["top_n"], 10000);
    }

    #[test]
    fn test_controller_settings_follow_config() {
        let config: DevInsightConfig =
            serde_json::from_str(r#"{"page_size": 25, "debounce_ms": 0}"#).unwrap();
        let settings = config.resolve().unwrap().controller_settings();
        assert_eq!(settings.limit, PageLimit::TwentyFive);
        assert!(settings.debounce.is_immediate());
    }
}
