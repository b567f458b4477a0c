//! Configuration Management
//!
//! Handles persistent configuration storage for azcatalog.

use crate::navigator::DEFAULT_MANAGEMENT_ENDPOINT;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable consulted when no subscription is configured
pub const SUBSCRIPTION_ENV: &str = "AZURE_SUBSCRIPTION_ID";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Default subscription used to seed navigation
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Catalog file replacing the embedded one
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    /// Resource Manager endpoint requests are planned against
    #[serde(default)]
    pub management_endpoint: Option<String>,
    /// Last URL navigated to
    #[serde(default)]
    pub last_url: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("azcatalog").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective subscription (config > environment)
    pub fn effective_subscription(&self) -> Option<String> {
        self.subscription_id
            .clone()
            .or_else(|| std::env::var(SUBSCRIPTION_ENV).ok())
            .filter(|s| !s.is_empty())
    }

    /// Get effective management endpoint (config > public cloud)
    pub fn effective_endpoint(&self) -> String {
        self.management_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_MANAGEMENT_ENDPOINT.to_string())
    }

    /// Set subscription and save
    pub fn set_subscription(&mut self, subscription_id: &str) -> Result<()> {
        self.subscription_id = Some(subscription_id.to_string());
        self.save()
    }

    /// Set catalog override and save
    pub fn set_catalog_path(&mut self, path: PathBuf) -> Result<()> {
        self.catalog_path = Some(path);
        self.save()
    }

    /// Set management endpoint and save
    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        self.management_endpoint = Some(endpoint.to_string());
        self.save()
    }

    /// Remember the last URL navigated to and save
    pub fn set_last_url(&mut self, url: &str) -> Result<()> {
        self.last_url = Some(url.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.effective_endpoint(), DEFAULT_MANAGEMENT_ENDPOINT);
    }

    #[test]
    fn test_configured_subscription_wins() {
        let config = Config {
            subscription_id: Some("from-config".to_string()),
            ..Config::default()
        };
        assert_eq!(config.effective_subscription().as_deref(), Some("from-config"));
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = Config {
            subscription_id: Some("s1".to_string()),
            catalog_path: Some(PathBuf::from("/tmp/catalog.yaml")),
            management_endpoint: Some("https://management.usgovcloudapi.net".to_string()),
            last_url: None,
        };
        let content = serde_json::to_string_pretty(&config).unwrap();
        assert_eq!(serde_json::from_str::<Config>(&content).unwrap(), config);
    }
}
