//! HTTP handlers for the webhook gateway

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::AppState;
use signal_core::{symbols, CalculationError, Direction, PipelineError};

/// GET / - service banner
pub async fn home() -> impl IntoResponse {
    Json(json!({
        "status": "running",
        "service": "signal-gateway",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /health - configuration status
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let table = state.pipeline.store().snapshot().await;
    Json(json!({
        "status": "healthy",
        "telegram_configured": state.telegram.is_some(),
        "assets": table.asset_symbols(),
        "rules_source": state.rule_source.describe(),
    }))
}

/// GET /metrics - signal counters
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.metrics.snapshot().await)
}

/// Structured alert payload in the TradingView webhook shape
#[derive(Debug, Deserialize)]
pub struct TradingViewAlert {
    #[serde(default, alias = "strategy.order.action")]
    pub action: Option<String>,
    #[serde(default, alias = "symbol")]
    pub ticker: Option<String>,
    #[serde(default, alias = "price")]
    pub close: Option<Decimal>,
    #[serde(default, alias = "timeframe")]
    pub interval: Option<String>,
    #[serde(default)]
    pub tp1: Option<Decimal>,
    #[serde(default)]
    pub tp2: Option<Decimal>,
    #[serde(default)]
    pub tp3: Option<Decimal>,
    #[serde(default)]
    pub sl: Option<Decimal>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
}

/// POST /webhook - structured alert, formatted and forwarded as-is.
///
/// Levels supplied by the caller are passed through untouched; alerts
/// without levels are forwarded as plain direction/entry notices.
pub async fn webhook_alert(
    State(state): State<Arc<AppState>>,
    Json(alert): Json<TradingViewAlert>,
) -> impl IntoResponse {
    if let Some(expected) = &state.webhook_secret {
        if alert.secret.as_deref() != Some(expected.as_str()) {
            warn!("webhook alert rejected: invalid secret");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid secret"})),
            );
        }
    }
    state.metrics.increment("alerts_received").await;

    let direction = alert
        .action
        .as_deref()
        .and_then(|a| symbols::direction_from_keyword(&symbols::clean_token(a)));
    let Some(direction) = direction else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "unrecognized action"})),
        );
    };
    let Some(ticker) = alert.ticker.clone().filter(|t| !t.is_empty()) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "missing ticker"})),
        );
    };

    let message = format_alert_message(direction, &ticker, &alert);
    info!(ticker = %ticker, %direction, "structured alert received");

    if let Some(telegram) = &state.telegram {
        if let Err(e) = telegram.send_message(&message).await {
            error!("telegram delivery failed: {e:#}");
            state.metrics.increment("telegram_errors").await;
        }
    }
    state.metrics.record_signal().await;

    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "direction": direction.to_string(),
            "ticker": ticker,
        })),
    )
}

fn format_alert_message(
    direction: Direction,
    ticker: &str,
    alert: &TradingViewAlert,
) -> String {
    let emoji = match direction {
        Direction::Long => "🟢",
        Direction::Short => "🔴",
    };
    let mut message = format!("{emoji} *{direction} {ticker}*\n━━━━━━━━━━━━━━━━━━━━\n");
    if let Some(interval) = &alert.interval {
        message.push_str(&format!("⏱️ Timeframe: `{interval}`\n"));
    }
    if let Some(close) = alert.close {
        message.push_str(&format!("💵 Entry: `{close}`\n"));
    }
    if let (Some(tp1), Some(tp2), Some(tp3)) = (alert.tp1, alert.tp2, alert.tp3) {
        message.push_str(&format!(
            "🎯 *Targets:*\n├─ TP1: `{tp1}`\n├─ TP2: `{tp2}`\n└─ TP3: `{tp3}`\n"
        ));
    }
    if let Some(sl) = alert.sl {
        message.push_str(&format!("🛡️ Stop Loss: `{sl}`\n"));
    }
    if let Some(comment) = alert.comment.as_deref().filter(|c| !c.is_empty()) {
        message.push_str(&format!("📝 {comment}\n"));
    }
    let timestamp = alert
        .time
        .clone()
        .unwrap_or_else(|| Utc::now().to_rfc3339());
    message.push_str(&format!("⏰ {timestamp}"));
    message
}

#[derive(Debug, Deserialize)]
struct RawAlertBody {
    message: String,
}

/// POST /webhook/raw - free-text alert through the full pipeline.
///
/// Accepts either a plain text body or `{"message": "..."}`. Ordinary
/// chatter is acknowledged and ignored without side effects; other
/// failures come back with the pipeline stage they originated from.
pub async fn webhook_raw(
    State(state): State<Arc<AppState>>,
    body: String,
) -> impl IntoResponse {
    let message = match serde_json::from_str::<RawAlertBody>(&body) {
        Ok(parsed) => parsed.message,
        Err(_) => body,
    };

    match state.pipeline.process(&message).await {
        Ok(levels) => {
            let formatted = state.formatter.format(&levels);
            let signal_id = Uuid::new_v4();
            info!(
                %signal_id,
                asset = %levels.asset,
                direction = %levels.direction,
                "signal processed"
            );

            if let Some(telegram) = &state.telegram {
                if let Err(e) = telegram.send_message(&formatted.telegram_message).await {
                    error!(%signal_id, "telegram delivery failed: {e:#}");
                    state.metrics.increment("telegram_errors").await;
                }
            }
            state.metrics.record_signal().await;

            (
                StatusCode::OK,
                Json(json!({
                    "status": "success",
                    "id": signal_id.to_string(),
                    "signal": formatted.webhook_payload,
                    "message": formatted.plain_text,
                })),
            )
        }
        Err(e) if e.is_silent() => {
            state.metrics.increment("ignored_messages").await;
            (StatusCode::OK, Json(json!({"status": "ignored"})))
        }
        Err(e) => {
            let stage = e.stage();
            state.metrics.increment(&format!("failures.{stage}")).await;
            warn!(%stage, "signal rejected: {e}");

            let status = match &e {
                PipelineError::Calculate(CalculationError::PriceUnavailable { .. }) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            };
            (
                status,
                Json(json!({
                    "status": "rejected",
                    "stage": stage,
                    "error": e.to_string(),
                })),
            )
        }
    }
}

/// POST /rules/reload - re-fetch the rule table and swap it atomically
pub async fn reload_rules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state
        .pipeline
        .store()
        .reload(state.rule_source.as_ref())
        .await
    {
        Ok(()) => {
            let table = state.pipeline.store().snapshot().await;
            state.metrics.increment("rule_reloads").await;
            (
                StatusCode::OK,
                Json(json!({"status": "reloaded", "assets": table.len()})),
            )
        }
        Err(e) => {
            error!("rule reload failed: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "error": format!("{e:#}")})),
            )
        }
    }
}
