use std::sync::Arc;
use tracing::{info, warn, Level};

use signal_core::{RuleStore, SignalPipeline};
use signal_gateway::config::GatewayConfig;
use signal_gateway::formatter::{MessageTemplate, SignalFormatter};
use signal_gateway::observability::Metrics;
use signal_gateway::pricing::{
    BinancePriceProvider, FallbackPriceProvider, StaticPriceProvider,
};
use signal_gateway::telegram::TelegramSender;
use signal_gateway::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = GatewayConfig::default();
    info!("Starting Signal Gateway...");

    // Rule table: validated in full before the service starts serving
    let rule_source = config.rule_source();
    let store = RuleStore::load(rule_source.as_ref()).await?;
    info!("✓ Rule table loaded from {}", rule_source.describe());

    // Price lookup: live Binance feed with static reference fallback
    let live = Arc::new(BinancePriceProvider::new());
    let reference = Arc::new(StaticPriceProvider::with_reference_prices());
    let provider = Arc::new(FallbackPriceProvider::new(live, reference));

    let pipeline =
        SignalPipeline::new(store, provider).with_price_timeout(config.price_timeout());

    let template = MessageTemplate::from_name(&config.template).unwrap_or_else(|| {
        warn!("Unknown template {:?}, falling back to standard", config.template);
        MessageTemplate::Standard
    });
    let formatter = SignalFormatter::new(template);

    let telegram = match (&config.telegram_bot_token, &config.telegram_chat_id) {
        (Some(token), Some(chat_id)) => {
            info!("✓ Telegram delivery configured");
            Some(TelegramSender::new(token.clone(), chat_id.clone()))
        }
        _ => {
            warn!("⚠ Telegram not configured, signals will only be returned over HTTP");
            None
        }
    };

    if config.webhook_secret.is_none() {
        warn!("⚠ WEBHOOK_SECRET not set, structured alerts are unauthenticated");
    }

    let state = Arc::new(AppState {
        pipeline,
        formatter,
        telegram,
        metrics: Metrics::new(),
        webhook_secret: config.webhook_secret.clone(),
        rule_source,
    });

    let app = signal_gateway::app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("🚀 Signal Gateway listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
