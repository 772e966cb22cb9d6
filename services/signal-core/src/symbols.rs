//! Shared token normalization for directions and timeframes.
//!
//! Both the message parser and the rule-table loader go through these
//! functions, so a timeframe spelled `5m` in a chat message and `M5` in
//! the rule config always land on the same canonical token.

use crate::types::{Direction, Timeframe};

/// Map emoji direction markers to their keyword form before tokenizing
pub fn map_direction_markers(text: &str) -> String {
    text.replace('\u{1F7E2}', " LONG ") // 🟢
        .replace('\u{1F534}', " SHORT ") // 🔴
}

/// Match a cleaned, uppercased token against the direction keyword sets
pub fn direction_from_keyword(token: &str) -> Option<Direction> {
    match token {
        "LONG" | "BUY" | "L" => Some(Direction::Long),
        "SHORT" | "SELL" | "S" => Some(Direction::Short),
        _ => None,
    }
}

/// Strip decoration from a token: keep ASCII alphanumerics, uppercase
pub fn clean_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Whether a cleaned token matches the timeframe grammar: digits with an
/// optional M/H/D prefix or M/H/D/MIN suffix. Grammar only; the token may
/// still fail to normalize to a known timeframe.
pub fn looks_like_timeframe(token: &str) -> bool {
    if token.is_empty() || token.len() > 6 {
        return false;
    }
    if let Some(head) = token.strip_suffix("MIN") {
        return is_digits(head);
    }
    if let Some(tail) = token
        .strip_prefix('M')
        .or_else(|| token.strip_prefix('H'))
        .or_else(|| token.strip_prefix('D'))
    {
        return is_digits(tail);
    }
    if let Some(head) = token
        .strip_suffix('M')
        .or_else(|| token.strip_suffix('H'))
        .or_else(|| token.strip_suffix('D'))
    {
        return is_digits(head);
    }
    is_digits(token)
}

enum TfScale {
    Minutes,
    Hours,
    Days,
}

/// Normalize a timeframe token to its canonical form.
///
/// Accepts letter-prefixed (`M5`, `H1`), letter-suffixed (`5M`, `1H`,
/// `5MIN`) and bare forms; bare digit counts are assumed to be minutes.
/// Returns `None` for anything outside the known timeframe set.
pub fn normalize_timeframe(token: &str) -> Option<Timeframe> {
    let t = clean_token(token);

    let (digits, scale) = if let Some(head) = t.strip_suffix("MIN") {
        (head, TfScale::Minutes)
    } else if let Some(tail) = t.strip_prefix('M') {
        (tail, TfScale::Minutes)
    } else if let Some(tail) = t.strip_prefix('H') {
        (tail, TfScale::Hours)
    } else if let Some(tail) = t.strip_prefix('D') {
        (tail, TfScale::Days)
    } else if let Some(head) = t.strip_suffix('M') {
        (head, TfScale::Minutes)
    } else if let Some(head) = t.strip_suffix('H') {
        (head, TfScale::Hours)
    } else if let Some(head) = t.strip_suffix('D') {
        (head, TfScale::Days)
    } else {
        (t.as_str(), TfScale::Minutes)
    };

    let count: u32 = if is_digits(digits) {
        digits.parse().ok()?
    } else {
        return None;
    };

    match (scale, count) {
        (TfScale::Minutes, 1) => Some(Timeframe::M1),
        (TfScale::Minutes, 5) => Some(Timeframe::M5),
        (TfScale::Minutes, 15) => Some(Timeframe::M15),
        (TfScale::Minutes, 30) => Some(Timeframe::M30),
        (TfScale::Hours, 1) => Some(Timeframe::H1),
        (TfScale::Hours, 4) => Some(Timeframe::H4),
        (TfScale::Days, 1) => Some(Timeframe::D1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_keywords() {
        assert_eq!(direction_from_keyword("LONG"), Some(Direction::Long));
        assert_eq!(direction_from_keyword("BUY"), Some(Direction::Long));
        assert_eq!(direction_from_keyword("L"), Some(Direction::Long));
        assert_eq!(direction_from_keyword("SHORT"), Some(Direction::Short));
        assert_eq!(direction_from_keyword("SELL"), Some(Direction::Short));
        assert_eq!(direction_from_keyword("S"), Some(Direction::Short));
        assert_eq!(direction_from_keyword("HOLD"), None);
    }

    #[test]
    fn test_normalize_letter_prefixed() {
        assert_eq!(normalize_timeframe("M5"), Some(Timeframe::M5));
        assert_eq!(normalize_timeframe("m15"), Some(Timeframe::M15));
        assert_eq!(normalize_timeframe("H1"), Some(Timeframe::H1));
        assert_eq!(normalize_timeframe("H4"), Some(Timeframe::H4));
        assert_eq!(normalize_timeframe("D1"), Some(Timeframe::D1));
    }

    #[test]
    fn test_normalize_suffixed_and_bare() {
        assert_eq!(normalize_timeframe("5M"), Some(Timeframe::M5));
        assert_eq!(normalize_timeframe("1H"), Some(Timeframe::H1));
        assert_eq!(normalize_timeframe("4h"), Some(Timeframe::H4));
        assert_eq!(normalize_timeframe("15m"), Some(Timeframe::M15));
        assert_eq!(normalize_timeframe("5MIN"), Some(Timeframe::M5));
        // Bare counts are minutes
        assert_eq!(normalize_timeframe("5"), Some(Timeframe::M5));
        assert_eq!(normalize_timeframe("30"), Some(Timeframe::M30));
        // 60 bare is sixty minutes, not H1
        assert_eq!(normalize_timeframe("60"), None);
    }

    #[test]
    fn test_normalize_rejects_unknown() {
        assert_eq!(normalize_timeframe("M7"), None);
        assert_eq!(normalize_timeframe("H2"), None);
        assert_eq!(normalize_timeframe("BTCUSD"), None);
        assert_eq!(normalize_timeframe(""), None);
        assert_eq!(normalize_timeframe("M"), None);
    }

    #[test]
    fn test_timeframe_grammar() {
        for tok in ["M5", "5M", "5", "15", "H1", "1H", "5MIN", "M99"] {
            assert!(looks_like_timeframe(tok), "{tok} should match grammar");
        }
        for tok in ["BTCUSD", "GOLD", "", "MIN", "M", "US30"] {
            assert!(!looks_like_timeframe(tok), "{tok} should not match");
        }
    }

    #[test]
    fn test_clean_token() {
        assert_eq!(clean_token("*btc!"), "BTC");
        assert_eq!(clean_token("m5,"), "M5");
        assert_eq!(clean_token("🚀"), "");
    }
}
