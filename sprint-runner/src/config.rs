//! Serializable ledger configuration.
//!
//! A `LedgerConfig` captures everything needed to stand up a fresh ledger:
//! - the custody account
//! - the token (symbol, decimals)
//! - the tier catalog
//! - genesis mints
//!
//! ```toml
//! custody = "stable-sprints-custody"
//!
//! [token]
//! symbol = "mUSDC"
//! decimals = 18
//!
//! [[tiers]]
//! name = "Quick Sprint"
//! lock_secs = 60
//! yield_bps = 100
//!
//! [[genesis]]
//! account = "alice"
//! amount = "1000"
//! ```

use crate::amount::AmountSpec;
use serde::{Deserialize, Serialize};
use sprint_core::domain::{default_tier_specs, AccountId, CatalogError, TierCatalog, TierSpec};
use sprint_core::ledger::{PositionLedger, DEFAULT_CUSTODY};
use sprint_core::token::{MockUsdc, TokenError, UnitsError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from loading or applying a ledger configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid tier catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("genesis amount for '{account}': {source}")]
    GenesisAmount { account: String, source: UnitsError },

    #[error("genesis mint failed: {0}")]
    Mint(#[from] TokenError),
}

fn default_custody() -> String {
    DEFAULT_CUSTODY.to_string()
}

fn default_tiers() -> Vec<TierSpec> {
    default_tier_specs()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_symbol() -> String {
    "mUSDC".to_string()
}

fn default_decimals() -> u8 {
    18
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            decimals: default_decimals(),
        }
    }
}

/// Tokens minted to an account when the ledger is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisMint {
    pub account: String,
    pub amount: AmountSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_custody")]
    pub custody: String,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genesis: Vec<GenesisMint>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            custody: default_custody(),
            token: TokenConfig::default(),
            tiers: default_tiers(),
            genesis: Vec::new(),
        }
    }
}

impl LedgerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.catalog()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validated tier catalog.
    pub fn catalog(&self) -> Result<TierCatalog, CatalogError> {
        TierCatalog::new(self.tiers.clone())
    }

    /// Fresh ledger with genesis mints applied.
    pub fn build_ledger(&self) -> Result<PositionLedger<MockUsdc>, ConfigError> {
        let mut token = MockUsdc::new(self.token.symbol.clone(), self.token.decimals);
        for mint in &self.genesis {
            let amount = mint
                .amount
                .resolve(self.token.decimals)
                .map_err(|source| ConfigError::GenesisAmount {
                    account: mint.account.clone(),
                    source,
                })?;
            token.mint(&AccountId::new(mint.account.as_str()), amount)?;
            debug!(account = %mint.account, amount = %amount, "genesis mint");
        }
        Ok(PositionLedger::new(
            self.catalog()?,
            token,
            AccountId::new(self.custody.as_str()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprint_core::domain::TierId;
    use sprint_core::token::TokenLedger;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = LedgerConfig::from_toml("").unwrap();
        assert_eq!(config, LedgerConfig::default());
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(TierId::LONG).unwrap().yield_rate_bps, 1_000);
    }

    #[test]
    fn custom_tiers_and_genesis() {
        let toml = r#"
custody = "vault"

[token]
symbol = "tUSD"
decimals = 6

[[tiers]]
name = "Day"
lock_secs = 86400
yield_bps = 10

[[genesis]]
account = "alice"
amount = "250.5"

[[genesis]]
account = "bob"
amount = 7
"#;
        let config = LedgerConfig::from_toml(toml).unwrap();
        let ledger = config.build_ledger().unwrap();
        assert_eq!(ledger.custody().as_str(), "vault");
        assert_eq!(ledger.tiers().len(), 1);
        assert_eq!(ledger.token().symbol, "tUSD");
        assert_eq!(ledger.token().balance_of(&AccountId::new("alice")), 250_500_000);
        assert_eq!(ledger.token().balance_of(&AccountId::new("bob")), 7);
    }

    #[test]
    fn duplicate_tier_names_rejected() {
        let toml = r#"
[[tiers]]
name = "A"
lock_secs = 1
yield_bps = 1

[[tiers]]
name = "A"
lock_secs = 2
yield_bps = 2
"#;
        assert!(matches!(
            LedgerConfig::from_toml(toml),
            Err(ConfigError::Catalog(CatalogError::DuplicateName(_)))
        ));
    }

    #[test]
    fn explicit_empty_tiers_rejected() {
        assert!(matches!(
            LedgerConfig::from_toml("tiers = []"),
            Err(ConfigError::Catalog(CatalogError::Empty))
        ));
    }

    #[test]
    fn bad_genesis_amount_names_account() {
        let mut config = LedgerConfig::default();
        config.genesis.push(GenesisMint {
            account: "carol".into(),
            amount: AmountSpec::from("1.2.3"),
        });
        let err = config.build_ledger().unwrap_err();
        assert!(err.to_string().contains("carol"));
    }

    #[test]
    fn toml_roundtrip() {
        let config = LedgerConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(LedgerConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn from_file_reports_path() {
        let err = LedgerConfig::from_file(Path::new("/nonexistent/sprints.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/sprints.toml"));
    }
}
