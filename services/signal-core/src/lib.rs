//! Core pipeline for turning free-text trading alerts into price levels.
//!
//! Raw text goes through three stages: parse into a [`TradingIntent`],
//! resolve the matching take-profit/stop-loss rule from the [`RuleStore`],
//! then compute concrete levels with the calculator. Transports (chat,
//! webhook) live outside this crate and only consume [`LevelResult`] values.

pub mod types;
pub mod symbols;
pub mod parser;
pub mod rules;
pub mod calculator;
pub mod pipeline;

pub use types::*;
pub use rules::{AssetRule, ResolvedRule, RuleStore, RuleTable, TfRule};
pub use rules::source::{FileRuleSource, HttpRuleSource, RuleSource};
pub use pipeline::SignalPipeline;
