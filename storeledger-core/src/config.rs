//! Configuration management
//!
//! Settings live in `settings.json` inside the storeledger directory:
//! ```json
//! {
//!   "baseCurrency": "USD",
//!   "onInvalidRecord": "abort",
//!   "persistCounter": true,
//!   "accounts": { "receivable": "Assets:Accounts Receivable", ... },
//!   "output": { "accounts": "accounts.csv", ... }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{AccountNames, Currency};

/// Settings file name inside the storeledger directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Transaction counter file name inside the storeledger directory
pub const COUNTER_FILE: &str = "index";

/// What to do with a record that fails validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRecordPolicy {
    /// Fail the whole run
    #[default]
    Abort,
    /// Drop the record, report it and carry on
    Skip,
}

impl FromStr for InvalidRecordPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => anyhow::bail!("Unknown invalid-record policy: {}", other),
        }
    }
}

/// Output file names, relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputFiles {
    pub accounts: String,
    pub transactions: String,
    pub prices: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            accounts: "accounts.csv".to_string(),
            transactions: "transactions.csv".to_string(),
            prices: "prices.csv".to_string(),
        }
    }
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_invalid_record: Option<InvalidRecordPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    persist_counter: Option<bool>,
    #[serde(default)]
    accounts: AccountNames,
    #[serde(default)]
    output: OutputFiles,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// storeledger configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Currency of the fixed accounts when no deposit names a bank currency
    pub base_currency: Currency,
    pub on_invalid_record: InvalidRecordPolicy,
    /// Write the advanced transaction counter back after a run
    pub persist_counter: bool,
    pub accounts: AccountNames,
    pub output: OutputFiles,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            on_invalid_record: InvalidRecordPolicy::default(),
            persist_counter: true,
            accounts: AccountNames::default(),
            output: OutputFiles::default(),
            _raw_settings: SettingsFile::default(),
        }
    }
}

fn default_base_currency() -> Currency {
    Currency::new("USD").unwrap()
}

impl Config {
    /// Load config from the storeledger directory
    ///
    /// A missing or unreadable settings file gives the defaults. The invalid-record
    /// policy can be overridden with `STORELEDGER_ON_INVALID` (`abort` or `skip`).
    pub fn load(dir: &Path) -> Result<Self> {
        let settings_path = dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read {}", settings_path.display()))?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let base_currency = match raw.base_currency.as_deref() {
            Some(code) => Currency::new(code)
                .with_context(|| format!("Invalid baseCurrency in {}", settings_path.display()))?,
            None => default_base_currency(),
        };

        let on_invalid_record = match std::env::var("STORELEDGER_ON_INVALID").ok() {
            Some(value) => value.parse().context("Invalid STORELEDGER_ON_INVALID")?,
            None => raw.on_invalid_record.unwrap_or_default(),
        };

        Ok(Self {
            base_currency,
            on_invalid_record,
            persist_counter: raw.persist_counter.unwrap_or(true),
            accounts: raw.accounts.clone(),
            output: raw.output.clone(),
            _raw_settings: raw,
        })
    }

    /// Save config to the storeledger directory
    /// Preserves other settings that storeledger doesn't manage
    pub fn save(&self, dir: &Path) -> Result<()> {
        let settings_path = dir.join(SETTINGS_FILE);

        let mut settings = self._raw_settings.clone();
        settings.base_currency = Some(self.base_currency.to_string());
        settings.on_invalid_record = Some(self.on_invalid_record);
        settings.persist_counter = Some(self.persist_counter);
        settings.accounts = self.accounts.clone();
        settings.output = self.output.clone();

        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {}", settings_path.display()))?;
        Ok(())
    }

    /// The settings as they would be saved
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "baseCurrency": self.base_currency,
            "onInvalidRecord": self.on_invalid_record,
            "persistCounter": self.persist_counter,
            "accounts": self.accounts,
            "output": self.output,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_settings_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();

        assert_eq!(config.base_currency.as_str(), "USD");
        assert!(config.persist_counter);
        assert_eq!(config.output.transactions, "transactions.csv");
        assert_eq!(config.accounts, AccountNames::default());
    }

    #[test]
    fn test_load_partial_settings() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{
                "baseCurrency": "eur",
                "onInvalidRecord": "skip",
                "accounts": { "proceeds": "Assets:Store" },
                "somethingElse": 3
            }"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.base_currency.as_str(), "EUR");
        assert_eq!(config.accounts.proceeds, "Assets:Store");
        assert_eq!(config.accounts.sales, "Income:Sales");
        if std::env::var("STORELEDGER_ON_INVALID").is_err() {
            assert_eq!(config.on_invalid_record, InvalidRecordPolicy::Skip);
        }
    }

    #[test]
    fn test_invalid_base_currency_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), r#"{ "baseCurrency": "dollars" }"#).unwrap();
        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn test_save_preserves_unknown_settings() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), r#"{ "somethingElse": 3 }"#).unwrap();

        let mut config = Config::load(dir.path()).unwrap();
        config.persist_counter = false;
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap()).unwrap();
        assert_eq!(saved["somethingElse"], 3);
        assert_eq!(saved["persistCounter"], false);

        let reloaded = Config::load(dir.path()).unwrap();
        assert!(!reloaded.persist_counter);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Skip".parse::<InvalidRecordPolicy>().unwrap(), InvalidRecordPolicy::Skip);
        assert_eq!("abort".parse::<InvalidRecordPolicy>().unwrap(), InvalidRecordPolicy::Abort);
        assert!("ignore".parse::<InvalidRecordPolicy>().is_err());
    }
}
