//! Level calculator - turns a resolved rule and an entry price into
//! concrete TP1/TP2/TP3/SL prices plus a reward-to-risk ratio.
//!
//! All arithmetic is done on `Decimal`; chaining percentage math over the
//! three targets must not accumulate binary floating-point drift.

use rust_decimal::Decimal;

use crate::rules::ResolvedRule;
use crate::types::{CalculationError, Direction, LevelResult, RuleUnit};

/// Compute all levels for one signal.
///
/// Unit semantics:
/// - percent: delta = entry * magnitude / 100
/// - pips:    delta = magnitude * pip_size (per-asset, e.g. 0.01 for JPY pairs)
/// - points:  delta = magnitude (already in quote-currency units)
///
/// For LONG the targets sit above the entry and the stop below; SHORT is
/// mirrored. The ratio uses the tp1 distance over the stop distance and a
/// zero stop distance is an error, never an infinite or NaN ratio.
pub fn calculate(
    direction: Direction,
    resolved: &ResolvedRule,
    entry_price: Option<Decimal>,
) -> Result<LevelResult, CalculationError> {
    let entry = entry_price
        .ok_or_else(|| CalculationError::MissingEntryPrice(resolved.asset.clone()))?;

    let rule = resolved.rule;
    let delta = |magnitude: Decimal| -> Decimal {
        match rule.unit {
            RuleUnit::Percent => entry * magnitude / Decimal::ONE_HUNDRED,
            RuleUnit::Pips => magnitude * resolved.pip_size,
            RuleUnit::Points => magnitude,
        }
    };

    let (tp1_price, tp2_price, tp3_price, sl_price) = match direction {
        Direction::Long => (
            entry + delta(rule.tp1),
            entry + delta(rule.tp2),
            entry + delta(rule.tp3),
            entry - delta(rule.sl),
        ),
        Direction::Short => (
            entry - delta(rule.tp1),
            entry - delta(rule.tp2),
            entry - delta(rule.tp3),
            entry + delta(rule.sl),
        ),
    };

    let risk = (sl_price - entry).abs();
    if risk.is_zero() {
        return Err(CalculationError::ZeroRiskDistance(resolved.asset.clone()));
    }
    let reward = (tp1_price - entry).abs();
    let rr_ratio = (reward / risk).round_dp(2);

    Ok(LevelResult {
        direction,
        asset: resolved.asset.clone(),
        timeframe: resolved.timeframe,
        entry_price: entry,
        tp1_price,
        tp2_price,
        tp3_price,
        sl_price,
        rr_ratio,
        tp1_distance: rule.tp1,
        tp2_distance: rule.tp2,
        tp3_distance: rule.tp3,
        sl_distance: rule.sl,
        unit: rule.unit,
        display_decimals: resolved.display_decimals,
    })
}
