//! Pipeline orchestrator: parse -> resolve -> price -> calculate.
//!
//! Each invocation is independent and stateless apart from reading the
//! shared rule snapshot, so any number of messages can be processed
//! concurrently. The only await point that can block is the external
//! price lookup, which is bounded by a timeout.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::calculator;
use crate::parser;
use crate::rules::RuleStore;
use crate::types::{CalculationError, LevelResult, PipelineError, PriceProvider};

const DEFAULT_PRICE_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport-independent signal pipeline
pub struct SignalPipeline {
    store: RuleStore,
    price_provider: Arc<dyn PriceProvider>,
    price_timeout: Duration,
}

impl SignalPipeline {
    pub fn new(store: RuleStore, price_provider: Arc<dyn PriceProvider>) -> Self {
        Self {
            store,
            price_provider,
            price_timeout: DEFAULT_PRICE_TIMEOUT,
        }
    }

    pub fn with_price_timeout(mut self, timeout: Duration) -> Self {
        self.price_timeout = timeout;
        self
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Run one message through the full pipeline.
    ///
    /// Failures are tagged with the stage they came from; callers decide
    /// what to surface (`PipelineError::is_silent` marks ordinary chatter
    /// that should be ignored without side effects). When the message
    /// carries an explicit entry price no external lookup happens.
    pub async fn process(&self, raw: &str) -> Result<LevelResult, PipelineError> {
        let intent = parser::parse(raw)?;
        let resolved = self.store.resolve(&intent.asset, &intent.timeframe).await?;

        let entry = match intent.entry_price {
            Some(price) => price,
            None => self.lookup_price(&resolved.asset).await?,
        };

        let levels = calculator::calculate(intent.direction, &resolved, Some(entry))?;
        debug!(
            direction = %levels.direction,
            asset = %levels.asset,
            timeframe = %levels.timeframe,
            entry = %levels.entry_price,
            rr = %levels.rr_ratio,
            "signal computed"
        );
        Ok(levels)
    }

    async fn lookup_price(&self, symbol: &str) -> Result<Decimal, CalculationError> {
        let lookup = self.price_provider.current_price(symbol);
        let price = match tokio::time::timeout(self.price_timeout, lookup).await {
            Err(_) => {
                return Err(CalculationError::PriceUnavailable {
                    symbol: symbol.to_string(),
                    reason: format!(
                        "{} timed out after {:?}",
                        self.price_provider.name(),
                        self.price_timeout
                    ),
                })
            }
            Ok(Err(e)) => {
                return Err(CalculationError::PriceUnavailable {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                })
            }
            Ok(Ok(price)) => price,
        };

        if price <= Decimal::ZERO {
            return Err(CalculationError::PriceUnavailable {
                symbol: symbol.to_string(),
                reason: format!("non-positive price {} from {}", price, self.price_provider.name()),
            });
        }
        Ok(price)
    }
}
