//! DAO configuration

use crate::{Amount, DaoError, DaoResult};
use serde::{Deserialize, Serialize};

/// Governance parameters fixed at initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaoConfig {
    /// Human-readable name used in logs
    pub name: String,
    /// Minimum cumulative contribution for the stakeholder tier
    pub stakeholder_threshold: Amount,
    /// Length of each proposal's voting window, in seconds
    pub min_vote_period_secs: u64,
    /// Refuse disbursement while the voting window is still open
    pub require_closed_window: bool,
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            name: "dao".to_string(),
            stakeholder_threshold: Amount::from_millis(100),
            min_vote_period_secs: 300,
            require_closed_window: false,
        }
    }
}

impl DaoConfig {
    pub fn with_threshold(mut self, threshold: Amount) -> Self {
        self.stakeholder_threshold = threshold;
        self
    }

    pub fn with_vote_period_secs(mut self, secs: u64) -> Self {
        self.min_vote_period_secs = secs;
        self
    }

    pub fn with_closed_window_required(mut self, required: bool) -> Self {
        self.require_closed_window = required;
        self
    }

    pub fn vote_period(&self) -> chrono::Duration {
        i64::try_from(self.min_vote_period_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::TimeDelta::MAX)
    }

    pub fn validate(&self) -> DaoResult<()> {
        if self.stakeholder_threshold.is_zero() {
            return Err(DaoError::InvalidConfig(
                "stakeholder_threshold must be positive".into(),
            ));
        }
        if self.min_vote_period_secs == 0 {
            return Err(DaoError::InvalidConfig(
                "min_vote_period_secs must be positive".into(),
            ));
        }
        // chrono rejects durations past ~292 billion years
        if self.min_vote_period_secs > i64::MAX as u64 / 1_000 {
            return Err(DaoError::InvalidConfig(
                "min_vote_period_secs is out of range".into(),
            ));
        }
        Ok(())
    }
}
