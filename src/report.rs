// src/report.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::exchanges::types::PoolState;
use crate::opportunity::types::TradeDecision;

/// How many trailing simulation log lines end up in the report.
pub const TX_LOGS_TAIL: usize = 30;

/// JSON document printed on stdout at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrageReport {
    /// Human-readable trace of what the run did, in order.
    pub steps: Vec<String>,
    pub decision: TradeDecision,
    /// Snapshots the decision was made on, pool A first.
    #[serde(default)]
    pub pools: Vec<PoolState>,
    pub simulate_only: bool,
    pub signature: Option<String>,
    pub tx_logs_last: Option<Vec<String>>,

    pub timestamp: DateTime<Utc>,
    pub run_id: Uuid,
}

impl ArbitrageReport {
    pub fn new(steps: Vec<String>, decision: TradeDecision, simulate_only: bool) -> Self {
        Self {
            steps,
            decision,
            pools: Vec::new(),
            simulate_only,
            signature: None,
            tx_logs_last: None,
            timestamp: Utc::now(),
            run_id: Uuid::new_v4(),
        }
    }

    pub fn with_pools(mut self, pools: Vec<PoolState>) -> Self {
        self.pools = pools;
        self
    }

    pub fn with_signature(mut self, signature: String) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Keeps only the last [`TX_LOGS_TAIL`] lines.
    pub fn with_simulation_logs(mut self, logs: Vec<String>) -> Self {
        let skip = logs.len().saturating_sub(TX_LOGS_TAIL);
        self.tx_logs_last = Some(logs.into_iter().skip(skip).collect());
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
