//! Core value objects and the failure taxonomy

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Canonical chart timeframes a rule can be keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unit a rule's magnitudes are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleUnit {
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "pips")]
    Pips,
    #[serde(rename = "points")]
    Points,
}

impl RuleUnit {
    /// Suffix used when rendering a distance (e.g. "+1.5%")
    pub fn suffix(&self) -> &'static str {
        match self {
            RuleUnit::Percent => "%",
            RuleUnit::Pips => " pips",
            RuleUnit::Points => " pts",
        }
    }
}

/// Normalized trading intent extracted from one alert message.
///
/// `asset` and `timeframe` hold the tokens as written in the message;
/// canonical resolution against the rule table happens once, at the
/// pipeline stage, so alias knowledge lives in a single place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradingIntent {
    pub direction: Direction,
    pub asset: String,
    pub timeframe: String,
    pub entry_price: Option<Decimal>,
    pub raw_message: String,
    pub parsed_at: DateTime<Utc>,
}

/// Computed take-profit/stop-loss levels for one signal.
///
/// Carries the rule magnitudes and unit alongside the absolute prices so
/// presentation layers can render distances without another rule lookup.
/// Contains no wall-clock state: identical inputs produce identical values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelResult {
    pub direction: Direction,
    pub asset: String,
    pub timeframe: Timeframe,
    pub entry_price: Decimal,
    pub tp1_price: Decimal,
    pub tp2_price: Decimal,
    pub tp3_price: Decimal,
    pub sl_price: Decimal,
    /// Reward-to-risk using the tp1 distance over the stop distance
    pub rr_ratio: Decimal,
    pub tp1_distance: Decimal,
    pub tp2_distance: Decimal,
    pub tp3_distance: Decimal,
    pub sl_distance: Decimal,
    pub unit: RuleUnit,
    /// Decimal places to use when displaying prices for this asset
    pub display_decimals: u32,
}

/// Parse-stage failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Ordinary chat text; callers should ignore it silently
    #[error("not a trading signal")]
    NotASignal,

    #[error("unrecognized direction keyword in: {0}")]
    UnrecognizedDirection(String),

    #[error("incomplete signal, missing {missing}: {message}")]
    IncompleteMessage {
        missing: &'static str,
        message: String,
    },

    #[error("invalid price token: {0}")]
    InvalidPrice(String),
}

/// Rule-resolution failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleLookupError {
    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    #[error("unknown timeframe {timeframe} for asset {asset}")]
    UnknownTimeframe { asset: String, timeframe: String },
}

/// Calculation-stage failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculationError {
    #[error("no entry price available for {0}")]
    MissingEntryPrice(String),

    #[error("stop distance is zero for {0}")]
    ZeroRiskDistance(String),

    #[error("price unavailable for {symbol}: {reason}")]
    PriceUnavailable { symbol: String, reason: String },
}

/// Pipeline stage a failure originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parse,
    Resolve,
    Calculate,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Parse => write!(f, "parse"),
            Stage::Resolve => write!(f, "resolve"),
            Stage::Calculate => write!(f, "calculate"),
        }
    }
}

/// Stage-tagged pipeline failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("rule lookup failed: {0}")]
    Resolve(#[from] RuleLookupError),

    #[error("level calculation failed: {0}")]
    Calculate(#[from] CalculationError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Parse(_) => Stage::Parse,
            PipelineError::Resolve(_) => Stage::Resolve,
            PipelineError::Calculate(_) => Stage::Calculate,
        }
    }

    /// True for failures callers should swallow without surfacing
    /// (ordinary chatter that never looked like a signal).
    pub fn is_silent(&self) -> bool {
        matches!(self, PipelineError::Parse(ParseError::NotASignal))
    }
}

/// Trait for live price lookups when a message carries no entry price
#[async_trait::async_trait]
pub trait PriceProvider: Send + Sync {
    /// Current price for a canonical asset symbol, in quote currency
    async fn current_price(&self, symbol: &str) -> anyhow::Result<Decimal>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
