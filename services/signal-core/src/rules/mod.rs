//! Rule table: per-asset, per-timeframe TP/SL definitions.
//!
//! Configuration is validated in full before a table activates; a bad
//! table is rejected at load time and never serves queries. The active
//! table is an immutable snapshot behind an `Arc`, replaced wholesale on
//! reload so concurrent resolves see either the old or the new table,
//! never a mix.

pub mod source;

use anyhow::Context;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::symbols;
use crate::types::{RuleLookupError, RuleUnit, Timeframe};
use source::RuleSource;

/// Raw configuration as read from `config/rules.json` or a remote sheet
/// export, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    pub assets: BTreeMap<String, AssetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Quote-currency size of one pip; defaults to 0.0001
    #[serde(default)]
    pub pip_size: Option<Decimal>,
    /// Decimal places for displaying prices of this asset; defaults to 2
    #[serde(default)]
    pub display_decimals: Option<u32>,
    pub timeframes: BTreeMap<String, TfRuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TfRuleConfig {
    pub tp1: Decimal,
    pub tp2: Decimal,
    pub tp3: Decimal,
    pub sl: Decimal,
    pub unit: RuleUnit,
}

/// Configuration validation failures; all fatal at load time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("rule table has no assets")]
    Empty,

    #[error("symbol {alias:?} is configured for both {first} and {second}")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("asset {asset}: unknown timeframe key {token:?}")]
    UnknownTimeframe { asset: String, token: String },

    #[error("asset {asset}: timeframe {timeframe} defined more than once")]
    DuplicateTimeframe { asset: String, timeframe: Timeframe },

    #[error("asset {asset} {timeframe} {field}: magnitude must be positive, got {value}")]
    NonPositiveMagnitude {
        asset: String,
        timeframe: Timeframe,
        field: &'static str,
        value: Decimal,
    },

    #[error("asset {asset}: pip size must be positive, got {value}")]
    NonPositivePipSize { asset: String, value: Decimal },

    #[error("asset {asset}: no timeframes configured")]
    NoTimeframes { asset: String },
}

/// Validated TP/SL magnitudes for one asset/timeframe pair.
///
/// `tp1 < tp2 < tp3` is conventional but not enforced; consumers must use
/// the values as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TfRule {
    pub tp1: Decimal,
    pub tp2: Decimal,
    pub tp3: Decimal,
    pub sl: Decimal,
    pub unit: RuleUnit,
}

/// Validated per-asset rule set
#[derive(Debug, Clone)]
pub struct AssetRule {
    pub symbol: String,
    pub aliases: Vec<String>,
    pub pip_size: Decimal,
    pub display_decimals: u32,
    pub timeframes: HashMap<Timeframe, TfRule>,
}

/// A rule resolved for one concrete signal
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRule {
    /// Canonical asset symbol
    pub asset: String,
    pub timeframe: Timeframe,
    pub pip_size: Decimal,
    pub display_decimals: u32,
    pub rule: TfRule,
}

/// Immutable, validated rule table snapshot
#[derive(Debug)]
pub struct RuleTable {
    assets: HashMap<String, AssetRule>,
    /// Uppercased canonical symbols and aliases, all pointing at the
    /// canonical symbol. Disjointness is guaranteed by validation.
    symbol_index: HashMap<String, String>,
}

fn default_pip_size() -> Decimal {
    Decimal::new(1, 4) // 0.0001
}

const DEFAULT_DISPLAY_DECIMALS: u32 = 2;

impl RuleTable {
    /// Validate a raw config into an active table. Any duplicate alias,
    /// unknown timeframe key or non-positive magnitude rejects the whole
    /// table.
    pub fn validate(config: RulesConfig) -> Result<Self, ConfigError> {
        if config.assets.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut assets = HashMap::new();
        let mut symbol_index: HashMap<String, String> = HashMap::new();

        fn claim(
            token: &str,
            canonical: &str,
            index: &mut HashMap<String, String>,
        ) -> Result<(), ConfigError> {
            let key = symbols::clean_token(token);
            if let Some(first) = index.get(&key) {
                return Err(ConfigError::DuplicateAlias {
                    alias: token.to_string(),
                    first: first.clone(),
                    second: canonical.to_string(),
                });
            }
            index.insert(key, canonical.to_string());
            Ok(())
        }

        for (raw_symbol, asset_config) in config.assets {
            let symbol = symbols::clean_token(&raw_symbol);
            claim(&raw_symbol, &symbol, &mut symbol_index)?;
            for alias in &asset_config.aliases {
                claim(alias, &symbol, &mut symbol_index)?;
            }

            let pip_size = asset_config.pip_size.unwrap_or_else(default_pip_size);
            if pip_size <= Decimal::ZERO {
                return Err(ConfigError::NonPositivePipSize {
                    asset: symbol,
                    value: pip_size,
                });
            }

            if asset_config.timeframes.is_empty() {
                return Err(ConfigError::NoTimeframes { asset: symbol });
            }

            let mut timeframes = HashMap::new();
            for (token, tf_config) in &asset_config.timeframes {
                let timeframe = symbols::normalize_timeframe(token).ok_or_else(|| {
                    ConfigError::UnknownTimeframe {
                        asset: symbol.clone(),
                        token: token.clone(),
                    }
                })?;

                for (field, value) in [
                    ("tp1", tf_config.tp1),
                    ("tp2", tf_config.tp2),
                    ("tp3", tf_config.tp3),
                    ("sl", tf_config.sl),
                ] {
                    if value <= Decimal::ZERO {
                        return Err(ConfigError::NonPositiveMagnitude {
                            asset: symbol,
                            timeframe,
                            field,
                            value,
                        });
                    }
                }

                let rule = TfRule {
                    tp1: tf_config.tp1,
                    tp2: tf_config.tp2,
                    tp3: tf_config.tp3,
                    sl: tf_config.sl,
                    unit: tf_config.unit,
                };
                if timeframes.insert(timeframe, rule).is_some() {
                    return Err(ConfigError::DuplicateTimeframe {
                        asset: symbol,
                        timeframe,
                    });
                }
            }

            assets.insert(
                symbol.clone(),
                AssetRule {
                    symbol: symbol.clone(),
                    aliases: asset_config.aliases,
                    pip_size,
                    display_decimals: asset_config
                        .display_decimals
                        .unwrap_or(DEFAULT_DISPLAY_DECIMALS),
                    timeframes,
                },
            );
        }

        Ok(Self {
            assets,
            symbol_index,
        })
    }

    /// Resolve an asset token and timeframe token to a concrete rule.
    ///
    /// Asset matching is case-insensitive against canonical symbols and
    /// aliases. Unknown timeframes are reported distinctly from unknown
    /// assets.
    pub fn resolve(
        &self,
        asset_token: &str,
        timeframe_token: &str,
    ) -> Result<ResolvedRule, RuleLookupError> {
        let key = symbols::clean_token(asset_token);
        let asset = self
            .symbol_index
            .get(&key)
            .and_then(|canonical| self.assets.get(canonical))
            .ok_or_else(|| RuleLookupError::UnknownAsset(asset_token.to_string()))?;

        let unknown_tf = || RuleLookupError::UnknownTimeframe {
            asset: asset.symbol.clone(),
            timeframe: timeframe_token.to_string(),
        };
        let timeframe =
            symbols::normalize_timeframe(timeframe_token).ok_or_else(unknown_tf)?;
        let rule = asset.timeframes.get(&timeframe).ok_or_else(unknown_tf)?;

        Ok(ResolvedRule {
            asset: asset.symbol.clone(),
            timeframe,
            pip_size: asset.pip_size,
            display_decimals: asset.display_decimals,
            rule: *rule,
        })
    }

    pub fn asset_symbols(&self) -> Vec<String> {
        let mut list: Vec<String> = self.assets.keys().cloned().collect();
        list.sort();
        list
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Shared handle to the active rule table.
///
/// Cloning is cheap; all clones observe the same table. `reload` swaps
/// the snapshot atomically, so a resolve running concurrently keeps the
/// table it started with.
#[derive(Clone)]
pub struct RuleStore {
    table: Arc<RwLock<Arc<RuleTable>>>,
}

impl RuleStore {
    pub fn new(table: RuleTable) -> Self {
        Self {
            table: Arc::new(RwLock::new(Arc::new(table))),
        }
    }

    /// Fetch, validate and activate a table from a source
    pub async fn load(source: &dyn RuleSource) -> anyhow::Result<Self> {
        let table = Self::fetch_table(source).await?;
        info!(assets = table.len(), source = %source.describe(), "rule table loaded");
        Ok(Self::new(table))
    }

    /// Replace the active table. Validation happens before the swap; on
    /// any error the previous table stays active.
    pub async fn reload(&self, source: &dyn RuleSource) -> anyhow::Result<()> {
        let table = Self::fetch_table(source).await?;
        let assets = table.len();
        *self.table.write().await = Arc::new(table);
        info!(assets, source = %source.describe(), "rule table reloaded");
        Ok(())
    }

    async fn fetch_table(source: &dyn RuleSource) -> anyhow::Result<RuleTable> {
        let config = source
            .fetch()
            .await
            .with_context(|| format!("fetching rules from {}", source.describe()))?;
        let table = RuleTable::validate(config)
            .with_context(|| format!("validating rules from {}", source.describe()))?;
        Ok(table)
    }

    /// Current table snapshot
    pub async fn snapshot(&self) -> Arc<RuleTable> {
        self.table.read().await.clone()
    }

    pub async fn resolve(
        &self,
        asset_token: &str,
        timeframe_token: &str,
    ) -> Result<ResolvedRule, RuleLookupError> {
        self.snapshot().await.resolve(asset_token, timeframe_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn config(json: &str) -> RulesConfig {
        serde_json::from_str(json).unwrap()
    }

    fn sample_table() -> RuleTable {
        RuleTable::validate(config(
            r#"{
                "assets": {
                    "BTCUSD": {
                        "aliases": ["BTC", "BITCOIN"],
                        "timeframes": {
                            "M5": {"tp1": 1.0, "tp2": 2.0, "tp3": 3.5, "sl": 1.5, "unit": "%"}
                        }
                    },
                    "XAUUSD": {
                        "aliases": ["GOLD", "XAU"],
                        "timeframes": {
                            "M1": {"tp1": 0.3, "tp2": 0.6, "tp3": 1.0, "sl": 0.5, "unit": "%"}
                        }
                    },
                    "EURUSD": {
                        "pip_size": "0.0001",
                        "display_decimals": 5,
                        "timeframes": {
                            "M5": {"tp1": 10, "tp2": 20, "tp3": 30, "sl": 15, "unit": "pips"}
                        }
                    }
                }
            }"#,
        ))
        .unwrap()
    }

    #[test]
    fn test_alias_roundtrip_identical_rule() {
        let table = sample_table();
        let canonical = table.resolve("BTCUSD", "M5").unwrap();
        for token in ["btc", "Bitcoin", "BTC", "btcusd"] {
            let via_alias = table.resolve(token, "5m").unwrap();
            assert_eq!(via_alias.rule, canonical.rule);
            assert_eq!(via_alias.asset, "BTCUSD");
        }
    }

    #[test]
    fn test_timeframe_forms_resolve_identically() {
        let table = sample_table();
        for tf in ["M5", "5", "5M", "5min"] {
            let resolved = table.resolve("BTCUSD", tf).unwrap();
            assert_eq!(resolved.timeframe, Timeframe::M5);
        }
    }

    #[test]
    fn test_unknown_asset_vs_unknown_timeframe() {
        let table = sample_table();
        assert!(matches!(
            table.resolve("nasdaq", "15m"),
            Err(RuleLookupError::UnknownAsset(_))
        ));
        // Known asset, timeframe outside the canonical set
        assert!(matches!(
            table.resolve("BTCUSD", "M7"),
            Err(RuleLookupError::UnknownTimeframe { .. })
        ));
        // Known asset, known timeframe, but not configured for it
        assert!(matches!(
            table.resolve("BTCUSD", "H1"),
            Err(RuleLookupError::UnknownTimeframe { .. })
        ));
    }

    #[test]
    fn test_pip_size_and_decimals_defaults() {
        let table = sample_table();
        let eur = table.resolve("EURUSD", "M5").unwrap();
        assert_eq!(eur.pip_size, Decimal::from_str("0.0001").unwrap());
        assert_eq!(eur.display_decimals, 5);

        let btc = table.resolve("BTC", "M5").unwrap();
        assert_eq!(btc.pip_size, Decimal::new(1, 4));
        assert_eq!(btc.display_decimals, 2);
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let err = RuleTable::validate(config(
            r#"{
                "assets": {
                    "BTCUSD": {
                        "aliases": ["BTC"],
                        "timeframes": {"M5": {"tp1": 1, "tp2": 2, "tp3": 3, "sl": 1, "unit": "%"}}
                    },
                    "WBTCUSD": {
                        "aliases": ["btc"],
                        "timeframes": {"M5": {"tp1": 1, "tp2": 2, "tp3": 3, "sl": 1, "unit": "%"}}
                    }
                }
            }"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateAlias { .. }));
    }

    #[test]
    fn test_alias_colliding_with_canonical_rejected() {
        let err = RuleTable::validate(config(
            r#"{
                "assets": {
                    "BTCUSD": {
                        "timeframes": {"M5": {"tp1": 1, "tp2": 2, "tp3": 3, "sl": 1, "unit": "%"}}
                    },
                    "XAUUSD": {
                        "aliases": ["BTCUSD"],
                        "timeframes": {"M5": {"tp1": 1, "tp2": 2, "tp3": 3, "sl": 1, "unit": "%"}}
                    }
                }
            }"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateAlias { .. }));
    }

    #[test]
    fn test_non_positive_magnitudes_rejected() {
        let err = RuleTable::validate(config(
            r#"{
                "assets": {
                    "BTCUSD": {
                        "timeframes": {"M5": {"tp1": 1, "tp2": 2, "tp3": 3, "sl": 0, "unit": "%"}}
                    }
                }
            }"#,
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonPositiveMagnitude { field: "sl", .. }
        ));
    }

    #[test]
    fn test_unknown_timeframe_key_rejected() {
        let err = RuleTable::validate(config(
            r#"{
                "assets": {
                    "BTCUSD": {
                        "timeframes": {"M7": {"tp1": 1, "tp2": 2, "tp3": 3, "sl": 1, "unit": "%"}}
                    }
                }
            }"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTimeframe { .. }));
    }

    #[test]
    fn test_duplicate_timeframe_key_rejected() {
        // "5" and "M5" normalize to the same canonical timeframe
        let err = RuleTable::validate(config(
            r#"{
                "assets": {
                    "BTCUSD": {
                        "timeframes": {
                            "5": {"tp1": 1, "tp2": 2, "tp3": 3, "sl": 1, "unit": "%"},
                            "M5": {"tp1": 1, "tp2": 2, "tp3": 3, "sl": 2, "unit": "%"}
                        }
                    }
                }
            }"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTimeframe { .. }));
    }

    #[test]
    fn test_empty_table_rejected() {
        let err = RuleTable::validate(config(r#"{"assets": {}}"#)).unwrap_err();
        assert_eq!(err, ConfigError::Empty);
    }

    #[tokio::test]
    async fn test_reload_is_atomic_for_held_snapshots() {
        let store = RuleStore::new(sample_table());
        let before = store.snapshot().await;

        let replacement = RuleTable::validate(config(
            r#"{
                "assets": {
                    "ETHUSDT": {
                        "timeframes": {"H1": {"tp1": 2, "tp2": 4, "tp3": 6, "sl": 2, "unit": "%"}}
                    }
                }
            }"#,
        ))
        .unwrap();
        *store.table.write().await = Arc::new(replacement);

        // The held snapshot still serves the old table in full
        assert!(before.resolve("BTCUSD", "M5").is_ok());
        // New resolves see only the new table
        assert!(store.resolve("BTCUSD", "M5").await.is_err());
        assert!(store.resolve("ETHUSDT", "1H").await.is_ok());
    }
}
