//! Marketplace seed configuration.
//!
//! Binaries and test rigs boot the in-memory stores from a YAML file:
//! wallet accounts with opening balances and the initial listing catalog.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::domain::models::PriceType;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// A wallet account to open at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSeed {
    pub id: String,
    pub name: String,
    /// Opening balance in whole rupees.
    #[serde(default)]
    pub balance: i64,
}

/// A listing to place in the catalog at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSeed {
    pub id: String,
    pub seller_id: String,
    pub title: String,
    pub price: i64,
    pub price_type: PriceType,
}

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub users: Vec<UserSeed>,

    #[serde(default)]
    pub listings: Vec<ListingSeed>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl MarketConfig {
    /// Load and validate a configuration file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: MarketConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        info!(
            users = config.users.len(),
            listings = config.listings.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut user_ids = std::collections::HashSet::new();
        for user in &self.users {
            if !user_ids.insert(user.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate user id: {}",
                    user.id
                )));
            }
            if user.balance < 0 {
                return Err(ConfigError::ValidationError(format!(
                    "negative opening balance for user {}: {}",
                    user.id, user.balance
                )));
            }
        }

        let mut listing_ids = std::collections::HashSet::new();
        for listing in &self.listings {
            if !listing_ids.insert(listing.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate listing id: {}",
                    listing.id
                )));
            }
            if listing.price <= 0 {
                return Err(ConfigError::ValidationError(format!(
                    "non-positive price for listing {}: {}",
                    listing.id, listing.price
                )));
            }
            if !user_ids.contains(listing.seller_id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "listing {} references unknown seller {}",
                    listing.id, listing.seller_id
                )));
            }
        }

        Ok(())
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            users: Vec::new(),
            listings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
log_level: debug
users:
  - id: user1
    name: Sita Sharma
    balance: 1500
  - id: user2
    name: Ram Thapa
    balance: 0
listings:
  - id: item1
    seller_id: user2
    title: Vintage Wooden Chair
    price: 1000
    price_type: fixed
  - id: item2
    seller_id: user2
    title: Mountain Bike
    price: 30000
    price_type: negotiable
"#;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = MarketConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.listings.len(), 2);
        assert_eq!(config.listings[1].price_type, PriceType::Negotiable);
    }

    #[test]
    fn test_unknown_seller_rejected() {
        let config: MarketConfig = serde_yaml::from_str(
            r#"
users:
  - id: user1
    name: Sita
listings:
  - id: item1
    seller_id: ghost
    title: Chair
    price: 100
    price_type: fixed
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let config: MarketConfig = serde_yaml::from_str(
            r#"
users:
  - id: user1
    name: Sita
  - id: user1
    name: Sita Again
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_balance_rejected() {
        let config: MarketConfig = serde_yaml::from_str(
            r#"
users:
  - id: user1
    name: Sita
    balance: -5
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            MarketConfig::load_from_file("does/not/exist.yaml").unwrap_err(),
            ConfigError::FileError(_)
        ));
    }
}
