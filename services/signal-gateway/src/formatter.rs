//! Signal presentation: renders a computed [`LevelResult`] into chat
//! markdown, plain text and a machine-readable webhook payload.

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;

use signal_core::{Direction, LevelResult};

/// Built-in message layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTemplate {
    Standard,
    Compact,
    Premium,
    Minimal,
}

impl MessageTemplate {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "standard" => Some(MessageTemplate::Standard),
            "compact" => Some(MessageTemplate::Compact),
            "premium" => Some(MessageTemplate::Premium),
            "minimal" => Some(MessageTemplate::Minimal),
            _ => None,
        }
    }

    pub fn names() -> &'static [&'static str] {
        &["standard", "compact", "premium", "minimal"]
    }
}

/// A signal rendered in every output form the transports need
#[derive(Debug, Clone)]
pub struct FormattedSignal {
    /// Markdown message for Telegram
    pub telegram_message: String,
    /// Same content with markdown stripped
    pub plain_text: String,
    /// JSON payload for downstream webhook consumers
    pub webhook_payload: serde_json::Value,
}

pub struct SignalFormatter {
    template: MessageTemplate,
    signature: String,
}

impl SignalFormatter {
    pub fn new(template: MessageTemplate) -> Self {
        Self {
            template,
            signature: "Signal Gateway".to_string(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    pub fn format(&self, levels: &LevelResult) -> FormattedSignal {
        let direction_emoji = match levels.direction {
            Direction::Long => "🟢",
            Direction::Short => "🔴",
        };
        let decimals = levels.display_decimals as usize;
        let price = |value: Decimal| format!("{:.decimals$}", value.round_dp(levels.display_decimals));

        let entry = price(levels.entry_price);
        let tp1 = price(levels.tp1_price);
        let tp2 = price(levels.tp2_price);
        let tp3 = price(levels.tp3_price);
        let sl = price(levels.sl_price);

        let suffix = levels.unit.suffix();
        let tp1_dist = format!("+{}{}", levels.tp1_distance, suffix);
        let tp2_dist = format!("+{}{}", levels.tp2_distance, suffix);
        let tp3_dist = format!("+{}{}", levels.tp3_distance, suffix);
        let sl_dist = format!("-{}{}", levels.sl_distance, suffix);

        let timestamp = Utc::now().format("%d/%m/%Y %H:%M:%S UTC").to_string();

        let telegram_message = match self.template {
            MessageTemplate::Standard => format!(
                "🚀 *{emoji} {dir} {asset}*\n\
                 ━━━━━━━━━━━━━━━━━━━━\n\
                 ⏱️ Timeframe: `{tf}`\n\
                 💵 Entry: `{entry}`\n\n\
                 🎯 *Targets:*\n\
                 ├─ TP1: `{tp1}` ({tp1_dist})\n\
                 ├─ TP2: `{tp2}` ({tp2_dist})\n\
                 └─ TP3: `{tp3}` ({tp3_dist})\n\n\
                 🛡️ Stop Loss: `{sl}` ({sl_dist})\n\
                 📊 Risk/Reward: `1:{rr}`\n\n\
                 ⏰ {timestamp}\n\
                 🤖 _{signature}_",
                emoji = direction_emoji,
                dir = levels.direction,
                asset = levels.asset,
                tf = levels.timeframe,
                rr = levels.rr_ratio,
                signature = self.signature,
            ),
            MessageTemplate::Compact => format!(
                "{emoji} *{dir} {asset}* | {tf}\n\
                 Entry: `{entry}`\n\
                 TP: `{tp1}` → `{tp2}` → `{tp3}`\n\
                 SL: `{sl}` | R:R `1:{rr}`",
                emoji = direction_emoji,
                dir = levels.direction,
                asset = levels.asset,
                tf = levels.timeframe,
                rr = levels.rr_ratio,
            ),
            MessageTemplate::Premium => format!(
                "{emoji} *SIGNAL {dir}* {emoji}\n\
                 📈 *{asset}* | ⏱ *{tf}*\n\
                 ━━━━━━━━━━━━━━━━━━━━\n\
                 💰 Entry Zone\n\
                 └─ `{entry}`\n\
                 🎯 Take Profits\n\
                 ├─ TP1: `{tp1}` ➜ {tp1_dist}\n\
                 ├─ TP2: `{tp2}` ➜ {tp2_dist}\n\
                 └─ TP3: `{tp3}` ➜ {tp3_dist}\n\
                 🛡️ Stop Loss\n\
                 └─ `{sl}` ➜ {sl_dist}\n\
                 📊 R:R Ratio: *1:{rr}*\n\
                 ━━━━━━━━━━━━━━━━━━━━\n\
                 ⏰ _{timestamp}_\n\
                 🤖 _{signature}_",
                emoji = direction_emoji,
                dir = levels.direction,
                asset = levels.asset,
                tf = levels.timeframe,
                rr = levels.rr_ratio,
                signature = self.signature,
            ),
            MessageTemplate::Minimal => format!(
                "{emoji} {asset} {tf}\n\
                 E: {entry} | TP: {tp1}/{tp2}/{tp3} | SL: {sl}",
                emoji = direction_emoji,
                asset = levels.asset,
                tf = levels.timeframe,
            ),
        };

        let plain_text = telegram_message
            .replace('*', "")
            .replace('`', "")
            .replace('_', "");

        let webhook_payload = json!({
            "action": levels.direction.to_string().to_lowercase(),
            "symbol": levels.asset,
            "timeframe": levels.timeframe.as_str(),
            "price": levels.entry_price,
            "targets": {
                "tp1": levels.tp1_price,
                "tp2": levels.tp2_price,
                "tp3": levels.tp3_price,
            },
            "stoploss": levels.sl_price,
            "risk_reward": levels.rr_ratio,
            "timestamp": Utc::now().to_rfc3339(),
        });

        FormattedSignal {
            telegram_message,
            plain_text,
            webhook_payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_core::{RuleUnit, Timeframe};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample_levels() -> LevelResult {
        LevelResult {
            direction: Direction::Long,
            asset: "BTCUSD".to_string(),
            timeframe: Timeframe::M5,
            entry_price: dec("65000"),
            tp1_price: dec("65650"),
            tp2_price: dec("66300"),
            tp3_price: dec("67275"),
            sl_price: dec("64025"),
            rr_ratio: dec("0.67"),
            tp1_distance: dec("1.0"),
            tp2_distance: dec("2.0"),
            tp3_distance: dec("3.5"),
            sl_distance: dec("1.5"),
            unit: RuleUnit::Percent,
            display_decimals: 2,
        }
    }

    #[test]
    fn test_template_names_roundtrip() {
        for name in MessageTemplate::names() {
            assert!(MessageTemplate::from_name(name).is_some());
        }
        assert_eq!(MessageTemplate::from_name("fancy"), None);
    }

    #[test]
    fn test_standard_template_contents() {
        let formatter = SignalFormatter::new(MessageTemplate::Standard);
        let formatted = formatter.format(&sample_levels());

        assert!(formatted.telegram_message.contains("LONG BTCUSD"));
        assert!(formatted.telegram_message.contains("`65650.00`"));
        assert!(formatted.telegram_message.contains("(+1.0%)"));
        assert!(formatted.telegram_message.contains("`1:0.67`"));
        // Plain text version has the markdown stripped
        assert!(!formatted.plain_text.contains('`'));
        assert!(formatted.plain_text.contains("65650.00"));
    }

    #[test]
    fn test_display_decimals_respected() {
        let mut levels = sample_levels();
        levels.asset = "EURUSD".to_string();
        levels.entry_price = dec("1.0850");
        levels.tp1_price = dec("1.0860");
        levels.display_decimals = 5;

        let formatted = SignalFormatter::new(MessageTemplate::Compact).format(&levels);
        assert!(formatted.telegram_message.contains("1.08500"));
        assert!(formatted.telegram_message.contains("1.08600"));
    }

    #[test]
    fn test_webhook_payload_shape() {
        let formatted = SignalFormatter::new(MessageTemplate::Minimal).format(&sample_levels());
        let payload = &formatted.webhook_payload;

        assert_eq!(payload["action"], "long");
        assert_eq!(payload["symbol"], "BTCUSD");
        assert_eq!(payload["timeframe"], "M5");
        assert_eq!(payload["targets"]["tp1"], serde_json::json!(dec("65650")));
        assert_eq!(payload["stoploss"], serde_json::json!(dec("64025")));
    }
}
