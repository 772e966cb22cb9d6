//! Webhook gateway around the signal pipeline.
//!
//! Receives alerts over HTTP (raw chat text or structured TradingView
//! payloads), runs them through `signal-core`, and delivers formatted
//! results to Telegram and downstream webhook consumers.

pub mod config;
pub mod formatter;
pub mod handlers;
pub mod observability;
pub mod pricing;
pub mod telegram;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use formatter::SignalFormatter;
use observability::Metrics;
use signal_core::{RuleSource, SignalPipeline};
use telegram::TelegramSender;

/// Application state shared across handlers
pub struct AppState {
    pub pipeline: SignalPipeline,
    pub formatter: SignalFormatter,
    pub telegram: Option<TelegramSender>,
    pub metrics: Metrics,
    pub webhook_secret: Option<String>,
    /// Source used by the reload endpoint
    pub rule_source: Box<dyn RuleSource>,
}

/// Build the API router
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/webhook", post(handlers::webhook_alert))
        .route("/webhook/raw", post(handlers::webhook_raw))
        .route("/rules/reload", post(handlers::reload_rules))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
