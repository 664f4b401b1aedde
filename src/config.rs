//! Agent configuration
//!
//! Every section defaults independently, so a config file only needs the
//! keys it changes:
//!
//! ```json
//! { "concession": { "exponent": 2.0 }, "seed": 7 }
//! ```

use crate::error::{ParleyError, Result};
use crate::opponent::OpponentModelKind;
use crate::strategy::{
    AcceptanceConfig, BidSelection, BiddingConfig, ConcessionConfig, ConcessionCurve, IndexConfig,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cross-session adaptation settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Raise the concession floor from past agreements with the same opponent
    pub adapt: bool,
    /// Distance below the mean past agreement utility the floor is set to
    pub margin: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            adapt: true,
            margin: 0.1,
        }
    }
}

/// Full configuration of one negotiating agent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub concession: ConcessionConfig,
    pub bidding: BiddingConfig,
    pub acceptance: AcceptanceConfig,
    pub index: IndexConfig,
    pub opponent_model: OpponentModelKind,
    pub history: HistoryConfig,
    /// In the closing phase, offer back the best received bid when it beats
    /// the planned offer
    pub offer_best_when_closing: bool,
    /// Fixed RNG seed for reproducible sessions
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            concession: ConcessionConfig::default(),
            bidding: BiddingConfig::default(),
            acceptance: AcceptanceConfig::default(),
            index: IndexConfig::default(),
            opponent_model: OpponentModelKind::default(),
            history: HistoryConfig::default(),
            offer_best_when_closing: true,
            seed: None,
        }
    }
}

impl AgentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AgentConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Reject out-of-range parameters
    pub fn validate(&self) -> Result<()> {
        ConcessionCurve::new(
            self.concession.exponent,
            self.concession.min_utility,
            1.0,
        )?;

        let b = &self.bidding;
        if let BidSelection::Weighted { alpha } = b.selection {
            unit("bidding.selection.alpha", alpha)?;
        }
        non_negative("bidding.initial_delta", b.initial_delta)?;
        non_negative("bidding.repeat_tolerance", b.repeat_tolerance)?;
        if !b.widen_step.is_finite() || b.widen_step <= 0.0 {
            return Err(invalid("bidding.widen_step", b.widen_step));
        }
        at_least_one("bidding.max_candidates", b.max_candidates)?;
        at_least_one("bidding.top_k", b.top_k)?;
        at_least_one("bidding.time_budget_ms", b.time_budget_ms as usize)?;

        self.acceptance.validate()?;

        at_least_one("index.sample_size", self.index.sample_size)?;
        at_least_one("index.enumeration_cap", self.index.enumeration_cap as usize)?;

        if let OpponentModelKind::Recency {
            repeat_bonus,
            max_streak,
            decay,
        } = self.opponent_model
        {
            non_negative("opponent_model.repeat_bonus", repeat_bonus)?;
            at_least_one("opponent_model.max_streak", max_streak as usize)?;
            if !(decay > 0.0 && decay <= 1.0) {
                return Err(invalid("opponent_model.decay", decay));
            }
        }

        unit("history.margin", self.history.margin)
    }
}

fn invalid(name: &str, value: impl std::fmt::Display) -> ParleyError {
    ParleyError::InvalidConfig(format!("{} out of range: {}", name, value))
}

fn unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(name, value))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, value))
    }
}

fn at_least_one(name: &str, value: usize) -> Result<()> {
    if value >= 1 {
        Ok(())
    } else {
        Err(invalid(name, value))
    }
}
