//! Gateway configuration from environment variables

use signal_core::{FileRuleSource, HttpRuleSource, RuleSource};
use std::time::Duration;

/// Runtime configuration for the gateway service
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    /// Local rule file, used when no remote URL is set
    pub rules_path: String,
    /// Remote rule endpoint (e.g. a published sheet export); takes
    /// precedence over the local file
    pub rules_url: Option<String>,
    /// Shared secret required on structured webhook alerts
    pub webhook_secret: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub price_timeout_secs: u64,
    /// Formatter template name: standard, compact, premium, minimal
    pub template: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            rules_path: std::env::var("RULES_PATH")
                .unwrap_or_else(|_| "config/rules.json".to_string()),
            rules_url: std::env::var("RULES_URL").ok(),
            webhook_secret: std::env::var("WEBHOOK_SECRET").ok(),
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_chat_id: std::env::var("TELEGRAM_CHANNEL_ID").ok(),
            price_timeout_secs: std::env::var("PRICE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            template: std::env::var("SIGNAL_TEMPLATE")
                .unwrap_or_else(|_| "standard".to_string()),
        }
    }
}

impl GatewayConfig {
    pub fn price_timeout(&self) -> Duration {
        Duration::from_secs(self.price_timeout_secs)
    }

    /// Build the configured rule source
    pub fn rule_source(&self) -> Box<dyn RuleSource> {
        match &self.rules_url {
            Some(url) => Box::new(HttpRuleSource::new(url.clone())),
            None => Box::new(FileRuleSource::new(&self.rules_path)),
        }
    }
}
