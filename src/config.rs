use crate::app::ports::RegistryPort;
use crate::constants::{
    DEFAULT_CONFIG_PATH, DEFAULT_DB_PATH, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_MAX_PAGES_PER_UPDATE, DEFAULT_SAMPLE_CAP, ONE_YEAR_SECS,
};
use crate::error::{Result, SummaryError};
use crate::summary::SummarySettings;
use crate::types::DatasetInfo;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Env var overriding the config file location
pub const CONFIG_PATH_ENV: &str = "SUMMARY_CONFIG";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub summary: SummaryConfig,
    pub geocoder: Option<GeocoderConfig>,
    #[serde(default)]
    pub datasets: Vec<DatasetInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub sample_cap: u64,
    pub recency_window_secs: i64,
    pub max_pages_per_update: u32,
    pub db_path: PathBuf,
    pub http_timeout_secs: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            sample_cap: DEFAULT_SAMPLE_CAP,
            recency_window_secs: ONE_YEAR_SECS,
            max_pages_per_update: DEFAULT_MAX_PAGES_PER_UPDATE,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub area_type: Option<String>,
}

impl Config {
    /// Reads `path`, else `$SUMMARY_CONFIG`, else `summary.toml`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            SummaryError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_toml_str(&config_content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.summary.sample_cap == 0 {
            return Err(SummaryError::Config("summary.sample_cap must be > 0".into()));
        }
        if self.summary.max_pages_per_update == 0 {
            return Err(SummaryError::Config(
                "summary.max_pages_per_update must be > 0".into(),
            ));
        }
        if self.summary.recency_window_secs < 0 {
            return Err(SummaryError::Config(
                "summary.recency_window_secs must not be negative".into(),
            ));
        }

        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            if dataset.id.trim().is_empty() {
                return Err(SummaryError::Config("dataset id must not be empty".into()));
            }
            if !seen.insert(dataset.id.as_str()) {
                return Err(SummaryError::Config(format!(
                    "dataset '{}' is defined more than once",
                    dataset.id
                )));
            }
        }
        Ok(())
    }

    pub fn settings(&self) -> SummarySettings {
        SummarySettings {
            sample_cap: self.summary.sample_cap,
            recency_window_secs: self.summary.recency_window_secs,
            max_pages_per_update: self.summary.max_pages_per_update,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.summary.http_timeout_secs)
    }

    pub fn registry(&self) -> ConfigRegistry {
        ConfigRegistry::new(self.datasets.clone())
    }
}

/// Dataset registry backed by the `[[datasets]]` config table
pub struct ConfigRegistry {
    datasets: HashMap<String, DatasetInfo>,
}

impl ConfigRegistry {
    pub fn new(datasets: Vec<DatasetInfo>) -> Self {
        Self {
            datasets: datasets.into_iter().map(|d| (d.id.clone(), d)).collect(),
        }
    }
}

#[async_trait]
impl RegistryPort for ConfigRegistry {
    async fn lookup(&self, dataset_id: &str) -> Result<DatasetInfo> {
        self.datasets
            .get(dataset_id)
            .cloned()
            .ok_or_else(|| SummaryError::UnknownDataset(dataset_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [summary]
        sample_cap = 50
        recency_window_secs = 86400
        max_pages_per_update = 3
        db_path = "/tmp/summary.db"
        http_timeout_secs = 5

        [geocoder]
        base_url = "https://mapit.example"
        area_type = "WMC"

        [[datasets]]
        id = "org/sessions"
        title = "Org Sessions"
        feed_url = "https://org.example/feeds/sessions"
    "#;

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(FULL).unwrap();
        assert_eq!(
            config.settings(),
            SummarySettings {
                sample_cap: 50,
                recency_window_secs: 86400,
                max_pages_per_update: 3,
            }
        );
        assert_eq!(config.http_timeout(), Duration::from_secs(5));
        assert_eq!(config.summary.db_path, PathBuf::from("/tmp/summary.db"));
        assert_eq!(config.geocoder.unwrap().area_type.as_deref(), Some("WMC"));
    }

    #[test]
    fn test_defaults_apply() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.settings(), SummarySettings::default());
        assert_eq!(config.summary.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert!(config.geocoder.is_none());
        assert!(config.datasets.is_empty());
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            Config::from_toml_str("[summary]\nsample_cap = 0"),
            Err(SummaryError::Config(_))
        ));

        let duplicated = r#"
            [[datasets]]
            id = "a"
            title = "A"
            feed_url = "https://a.example"
            [[datasets]]
            id = "a"
            title = "A again"
            feed_url = "https://a.example/2"
        "#;
        assert!(matches!(
            Config::from_toml_str(duplicated),
            Err(SummaryError::Config(_))
        ));

        assert!(matches!(
            Config::from_toml_str("[summary]\nsample_cap = \"many\""),
            Err(SummaryError::Toml(_))
        ));
    }

    #[tokio::test]
    async fn test_registry_lookup() {
        let registry = Config::from_toml_str(FULL).unwrap().registry();
        let info = registry.lookup("org/sessions").await.unwrap();
        assert_eq!(info.feed_url, "https://org.example/feeds/sessions");
        assert!(matches!(
            registry.lookup("org/missing").await,
            Err(SummaryError::UnknownDataset(_))
        ));
    }
}
