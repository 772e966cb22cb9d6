//! Signal counters for the /metrics endpoint

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Process-local counters for signal traffic
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<RwLock<MetricsInner>>,
}

struct MetricsInner {
    counters: HashMap<String, u64>,
    last_signal_at: Option<DateTime<Utc>>,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsInner {
                counters: HashMap::new(),
                last_signal_at: None,
                start_time: Instant::now(),
            })),
        }
    }

    /// Increment a named counter
    pub async fn increment(&self, name: &str) {
        let mut inner = self.inner.write().await;
        *inner.counters.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Record a successfully produced signal
    pub async fn record_signal(&self) {
        let mut inner = self.inner.write().await;
        *inner.counters.entry("signals_sent".to_string()).or_insert(0) += 1;
        inner.last_signal_at = Some(Utc::now());
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.read().await;
        MetricsSnapshot {
            counters: inner.counters.clone(),
            last_signal_at: inner.last_signal_at,
            uptime_secs: inner.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub last_signal_at: Option<DateTime<Utc>>,
    pub uptime_secs: u64,
}
