//! Opponent preference estimation from observed offers
//!
//! Models only ever see the opponent's bids. Issue importance is inferred
//! from how concentrated the offered values are on each issue: an opponent
//! holds firm on issues it cares about and moves freely on the rest.

pub mod frequency;
pub mod recency;

pub use frequency::FrequencyModel;
pub use recency::RecencyModel;

use crate::domain::{Bid, Domain};
use serde::{Deserialize, Serialize};

/// Online estimate of the opponent's utility function
pub trait OpponentModel: Send {
    /// Fold one observed opponent bid into the model
    fn update(&mut self, bid: &Bid);

    /// Estimated opponent utility of a bid in `[0, 1]`; no side effects
    fn utility(&self, bid: &Bid) -> f64;

    /// Estimated issue weights, summing to 1
    fn issue_weights(&self) -> Vec<f64>;

    /// Number of bids folded in so far
    fn observations(&self) -> usize;

    fn name(&self) -> &'static str;
}

/// Which opponent model a session uses
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpponentModelKind {
    /// Plain value-frequency counting
    Frequency,
    /// Frequency counting that favours recent, repeated values
    Recency {
        #[serde(default = "default_repeat_bonus")]
        repeat_bonus: f64,
        #[serde(default = "default_max_streak")]
        max_streak: u32,
        #[serde(default = "default_decay")]
        decay: f64,
    },
}

fn default_repeat_bonus() -> f64 {
    0.5
}

fn default_max_streak() -> u32 {
    5
}

fn default_decay() -> f64 {
    0.9
}

impl Default for OpponentModelKind {
    fn default() -> Self {
        OpponentModelKind::Frequency
    }
}

impl OpponentModelKind {
    /// Recency model with its default tuning
    pub fn recency() -> Self {
        OpponentModelKind::Recency {
            repeat_bonus: default_repeat_bonus(),
            max_streak: default_max_streak(),
            decay: default_decay(),
        }
    }

    /// Instantiate the model for a domain
    pub fn build(&self, domain: &Domain) -> Box<dyn OpponentModel> {
        match self {
            OpponentModelKind::Frequency => Box::new(FrequencyModel::new(domain)),
            OpponentModelKind::Recency {
                repeat_bonus,
                max_streak,
                decay,
            } => Box::new(RecencyModel::new(domain, *repeat_bonus, *max_streak, *decay)),
        }
    }
}

/// Per-issue, per-value observation mass shared by the models
#[derive(Clone, Debug)]
pub(crate) struct ValueMass {
    mass: Vec<Vec<f64>>,
}

impl ValueMass {
    pub(crate) fn new(domain: &Domain) -> Self {
        Self {
            mass: domain
                .issues
                .iter()
                .map(|issue| vec![0.0; issue.values.len()])
                .collect(),
        }
    }

    pub(crate) fn issue_count(&self) -> usize {
        self.mass.len()
    }

    pub(crate) fn issue(&self, issue: usize) -> &[f64] {
        &self.mass[issue]
    }

    pub(crate) fn issue_mut(&mut self, issue: usize) -> &mut [f64] {
        &mut self.mass[issue]
    }

    /// Value holding the most mass on an issue, if any mass exists
    pub(crate) fn leader(&self, issue: usize) -> Option<usize> {
        let values = &self.mass[issue];
        let mut best: Option<usize> = None;
        for (i, m) in values.iter().enumerate() {
            if *m > 0.0 && best.map_or(true, |b| *m > values[b]) {
                best = Some(i);
            }
        }
        best
    }

    /// Peakedness weights: max mass minus the uniform expectation, normalized.
    ///
    /// Falls back to uniform weights when nothing is peaked yet.
    pub(crate) fn weights(&self) -> Vec<f64> {
        let n = self.mass.len();
        let uniform = vec![1.0 / n as f64; n];

        let peaks: Vec<f64> = self
            .mass
            .iter()
            .map(|values| {
                let total: f64 = values.iter().sum();
                if total <= 0.0 {
                    return 0.0;
                }
                let expected = total / values.len() as f64;
                let max = values.iter().cloned().fold(0.0, f64::max);
                (max - expected).max(0.0)
            })
            .collect();

        let sum: f64 = peaks.iter().sum();
        if !sum.is_finite() || sum <= f64::EPSILON {
            return uniform;
        }
        peaks.iter().map(|p| p / sum).collect()
    }

    /// Weighted sum of each value's mass relative to its issue's maximum
    pub(crate) fn utility(&self, bid: &Bid, weights: &[f64]) -> f64 {
        let total: f64 = self
            .mass
            .iter()
            .zip(weights)
            .zip(bid.values())
            .map(|((values, w), &v)| {
                let max = values.iter().cloned().fold(0.0, f64::max);
                if max <= 0.0 {
                    0.0
                } else {
                    w * values.get(v).copied().unwrap_or(0.0) / max
                }
            })
            .sum();
        total.clamp(0.0, 1.0)
    }
}
