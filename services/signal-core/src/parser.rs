//! Message parser - turns "LONG BTCUSD M5 @65000" into a trading intent.
//!
//! The parser is a pure function over the message text. It validates the
//! direction keyword and extracts the asset/timeframe/price tokens, but
//! does not resolve aliases; that happens against the rule table in the
//! pipeline so symbol knowledge stays in one place.

use chrono::Utc;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::symbols;
use crate::types::{ParseError, TradingIntent};

/// How far into the message a direction keyword may appear
const DIRECTION_WINDOW: usize = 3;

/// Parse a raw alert message into a [`TradingIntent`].
///
/// Supported shapes:
/// - `LONG BTCUSD M5`
/// - `BUY GOLD 5M`
/// - `SHORT ETH M1 @2450.50`
/// - `🟢 BTC 15`
///
/// Checks run in order: direction first, then asset and timeframe, so a
/// message with a bad direction keyword is never reported as a missing
/// asset. Text with nothing signal-shaped at all maps to
/// [`ParseError::NotASignal`].
pub fn parse(raw: &str) -> Result<TradingIntent, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::NotASignal);
    }

    let text = symbols::map_direction_markers(trimmed).to_uppercase();
    let (entry_price, text) = extract_price(&text)?;

    let tokens: Vec<String> = text
        .split_whitespace()
        .map(symbols::clean_token)
        .filter(|t| !t.is_empty())
        .collect();

    // Direction must sit in the leading tokens
    let mut direction = None;
    for (idx, token) in tokens.iter().take(DIRECTION_WINDOW).enumerate() {
        if let Some(dir) = symbols::direction_from_keyword(token) {
            direction = Some((idx, dir));
            break;
        }
    }

    let Some((direction_idx, direction)) = direction else {
        let signal_shaped = entry_price.is_some()
            || tokens.iter().any(|t| symbols::looks_like_timeframe(t));
        return Err(if signal_shaped {
            ParseError::UnrecognizedDirection(trimmed.to_string())
        } else {
            ParseError::NotASignal
        });
    };

    // Of the remaining tokens, the first timeframe-shaped one is the
    // timeframe and the first other one is the asset.
    let mut asset: Option<String> = None;
    let mut timeframe: Option<String> = None;
    for (idx, token) in tokens.iter().enumerate() {
        if idx == direction_idx {
            continue;
        }
        if timeframe.is_none() && symbols::looks_like_timeframe(token) {
            timeframe = Some(token.clone());
        } else if asset.is_none() {
            asset = Some(token.clone());
        }
    }

    let asset = asset.ok_or_else(|| ParseError::IncompleteMessage {
        missing: "asset",
        message: trimmed.to_string(),
    })?;
    let timeframe = timeframe.ok_or_else(|| ParseError::IncompleteMessage {
        missing: "timeframe",
        message: trimmed.to_string(),
    })?;

    Ok(TradingIntent {
        direction,
        asset,
        timeframe,
        entry_price,
        raw_message: trimmed.to_string(),
        parsed_at: Utc::now(),
    })
}

/// Extract an optional `@price` token and return the message without it.
///
/// Accepts `@65000`, `@ 2350.50` and comma-grouped `@65,000`. A marker
/// followed by anything that does not parse as a positive decimal is an
/// error rather than silently dropped.
fn extract_price(text: &str) -> Result<(Option<Decimal>, String), ParseError> {
    let Some(at) = text.find('@') else {
        return Ok((None, text.to_string()));
    };

    let after = &text[at + 1..];
    let skipped = after.len() - after.trim_start().len();
    let after = after.trim_start();

    let digits_len = after
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(after.len());
    let token = &after[..digits_len];

    let price = Decimal::from_str(&token.replace(',', ""))
        .map_err(|_| ParseError::InvalidPrice(format!("@{}", token)))?;
    if price <= Decimal::ZERO {
        return Err(ParseError::InvalidPrice(format!("@{}", token)));
    }

    let mut rest = String::with_capacity(text.len());
    rest.push_str(&text[..at]);
    rest.push(' ');
    rest.push_str(&text[at + 1 + skipped + digits_len..]);

    Ok((Some(price), rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    #[test]
    fn test_parse_basic_long() {
        let intent = parse("LONG BTCUSD M5").unwrap();
        assert_eq!(intent.direction, Direction::Long);
        assert_eq!(intent.asset, "BTCUSD");
        assert_eq!(intent.timeframe, "M5");
        assert_eq!(intent.entry_price, None);
        assert_eq!(intent.raw_message, "LONG BTCUSD M5");
    }

    #[test]
    fn test_parse_lowercase_and_aliases() {
        let intent = parse("sell nasdaq 15m").unwrap();
        assert_eq!(intent.direction, Direction::Short);
        assert_eq!(intent.asset, "NASDAQ");
        assert_eq!(intent.timeframe, "15M");

        let intent = parse("buy gold 1m @2350.50").unwrap();
        assert_eq!(intent.direction, Direction::Long);
        assert_eq!(intent.asset, "GOLD");
        assert_eq!(intent.timeframe, "1M");
        assert_eq!(intent.entry_price, Some(Decimal::from_str("2350.50").unwrap()));
    }

    #[test]
    fn test_parse_emoji_direction() {
        let intent = parse("🟢 BTC 15").unwrap();
        assert_eq!(intent.direction, Direction::Long);
        assert_eq!(intent.asset, "BTC");
        assert_eq!(intent.timeframe, "15");

        let intent = parse("🔴 ETH M5").unwrap();
        assert_eq!(intent.direction, Direction::Short);
    }

    #[test]
    fn test_parse_price_variants() {
        let intent = parse("LONG BTCUSD M5 @65000").unwrap();
        assert_eq!(intent.entry_price, Some(Decimal::from(65000)));

        let intent = parse("SHORT ETH M1 @ 2,450.50").unwrap();
        assert_eq!(intent.entry_price, Some(Decimal::from_str("2450.50").unwrap()));

        // Price marker in the middle of the message
        let intent = parse("BUY XAUUSD @2350 H1").unwrap();
        assert_eq!(intent.entry_price, Some(Decimal::from(2350)));
        assert_eq!(intent.timeframe, "H1");
    }

    #[test]
    fn test_parse_invalid_price() {
        assert!(matches!(
            parse("LONG BTCUSD M5 @abc"),
            Err(ParseError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse("LONG BTCUSD M5 @"),
            Err(ParseError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse("LONG BTCUSD M5 @0"),
            Err(ParseError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_parse_not_a_signal() {
        assert_eq!(parse("good morning everyone"), Err(ParseError::NotASignal));
        assert_eq!(parse(""), Err(ParseError::NotASignal));
        assert_eq!(parse("   "), Err(ParseError::NotASignal));
    }

    #[test]
    fn test_parse_unrecognized_direction() {
        // Looks like a signal (timeframe present) but direction is garbage
        assert!(matches!(
            parse("LNG BTCUSD M5"),
            Err(ParseError::UnrecognizedDirection(_))
        ));
        // Price marker alone also counts as signal-shaped
        assert!(matches!(
            parse("enter btcusd @65000"),
            Err(ParseError::UnrecognizedDirection(_))
        ));
    }

    #[test]
    fn test_parse_incomplete() {
        assert!(matches!(
            parse("LONG BTCUSD"),
            Err(ParseError::IncompleteMessage {
                missing: "timeframe",
                ..
            })
        ));
        assert!(matches!(
            parse("LONG M5"),
            Err(ParseError::IncompleteMessage { missing: "asset", .. })
        ));
    }

    #[test]
    fn test_direction_checked_before_completeness() {
        // A bad direction must never surface as a missing-asset error
        assert!(matches!(
            parse("HOLD M5"),
            Err(ParseError::UnrecognizedDirection(_))
        ));
    }
}
