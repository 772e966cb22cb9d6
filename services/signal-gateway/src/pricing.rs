//! Live price providers for signals that carry no explicit entry price

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use signal_core::PriceProvider;

const BINANCE_BASE: &str = "https://api.binance.com";

/// Canonical asset symbol -> Binance spot pair
static BINANCE_PAIRS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "BTCUSD" => "BTCUSDT",
    "ETHUSDT" => "ETHUSDT",
    "XAUUSD" => "PAXGUSDT",
    "SOLUSD" => "SOLUSDT",
};

/// Last-resort reference prices, used when no live source is reachable
/// and in simulation setups without network access.
static REFERENCE_PRICES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "BTCUSD" => "65000",
    "ETHUSDT" => "2450",
    "XAUUSD" => "2350",
    "EURUSD" => "1.0850",
    "GBPUSD" => "1.2650",
    "USDJPY" => "151.50",
    "US30" => "39500",
};

#[derive(Debug, Deserialize)]
struct BinanceTicker {
    price: String,
}

/// Spot price lookup against the Binance ticker endpoint
pub struct BinancePriceProvider {
    client: Client,
    base_url: String,
}

impl BinancePriceProvider {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: BINANCE_BASE.to_string(),
        }
    }

    /// Point the provider at a different host (tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn supports_symbol(symbol: &str) -> bool {
        BINANCE_PAIRS.contains_key(symbol)
    }
}

impl Default for BinancePriceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceProvider for BinancePriceProvider {
    async fn current_price(&self, symbol: &str) -> Result<Decimal> {
        let pair = BINANCE_PAIRS
            .get(symbol)
            .with_context(|| format!("no Binance pair mapped for {}", symbol))?;

        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("symbol", *pair)])
            .send()
            .await
            .context("Failed to send Binance request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Binance API error: {} - {}", status, body));
        }

        let ticker: BinanceTicker = response
            .json()
            .await
            .context("Failed to parse Binance response")?;
        let price = Decimal::from_str(&ticker.price)
            .with_context(|| format!("Failed to parse Binance price: {}", ticker.price))?;

        debug!(symbol, pair, %price, "binance price");
        Ok(price)
    }

    fn name(&self) -> &str {
        "binance"
    }
}

/// Fixed price table; the built-in table mirrors the reference prices
pub struct StaticPriceProvider {
    prices: HashMap<String, Decimal>,
}

impl StaticPriceProvider {
    pub fn new(prices: HashMap<String, Decimal>) -> Self {
        Self { prices }
    }

    pub fn with_reference_prices() -> Self {
        let prices = REFERENCE_PRICES
            .entries()
            .filter_map(|(symbol, value)| {
                Decimal::from_str(value)
                    .ok()
                    .map(|price| (symbol.to_string(), price))
            })
            .collect();
        Self { prices }
    }
}

#[async_trait]
impl PriceProvider for StaticPriceProvider {
    async fn current_price(&self, symbol: &str) -> Result<Decimal> {
        self.prices
            .get(symbol)
            .copied()
            .with_context(|| format!("no reference price for {}", symbol))
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Tries the primary provider and falls back on any error
pub struct FallbackPriceProvider {
    primary: Arc<dyn PriceProvider>,
    fallback: Arc<dyn PriceProvider>,
}

impl FallbackPriceProvider {
    pub fn new(primary: Arc<dyn PriceProvider>, fallback: Arc<dyn PriceProvider>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl PriceProvider for FallbackPriceProvider {
    async fn current_price(&self, symbol: &str) -> Result<Decimal> {
        match self.primary.current_price(symbol).await {
            Ok(price) => Ok(price),
            Err(e) => {
                warn!(
                    symbol,
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    "primary price source failed: {e:#}"
                );
                self.fallback.current_price(symbol).await
            }
        }
    }

    fn name(&self) -> &str {
        "fallback-chain"
    }
}
