//! Recency-aware frequency model
//!
//! Repeating a value across consecutive offers earns a growing bonus, and
//! when the opponent stops offering an issue's leading value the mass of
//! every value it did not offer decays. Opponents that switch strategy
//! mid-session are tracked within a few offers instead of being averaged
//! away.

use crate::domain::{Bid, Domain};

use super::{OpponentModel, ValueMass};

#[derive(Clone, Debug)]
pub struct RecencyModel {
    mass: ValueMass,
    streaks: Vec<u32>,
    last: Option<Bid>,
    repeat_bonus: f64,
    max_streak: u32,
    decay: f64,
    observations: usize,
}

impl RecencyModel {
    /// `decay` is clamped to `(0, 1]`; `repeat_bonus` to `>= 0`.
    pub fn new(domain: &Domain, repeat_bonus: f64, max_streak: u32, decay: f64) -> Self {
        let decay = if decay.is_finite() && decay > 0.0 {
            decay.min(1.0)
        } else {
            1.0
        };
        Self {
            mass: ValueMass::new(domain),
            streaks: vec![0; domain.issue_count()],
            last: None,
            repeat_bonus: if repeat_bonus.is_finite() {
                repeat_bonus.max(0.0)
            } else {
                0.0
            },
            max_streak,
            decay,
            observations: 0,
        }
    }

    /// Accumulated mass of a value on an issue
    pub fn mass(&self, issue: usize, value: usize) -> f64 {
        self.mass.issue(issue)[value]
    }
}

impl OpponentModel for RecencyModel {
    fn update(&mut self, bid: &Bid) {
        let issues = self.mass.issue_count();
        for (issue, &value) in bid.values().iter().enumerate().take(issues) {
            if value >= self.mass.issue(issue).len() {
                continue;
            }

            let repeated = self
                .last
                .as_ref()
                .map_or(false, |last| last.values().get(issue) == Some(&value));
            self.streaks[issue] = if repeated {
                (self.streaks[issue] + 1).min(self.max_streak)
            } else {
                0
            };

            let leader = self.mass.leader(issue);
            let decay = self.decay;
            let values = self.mass.issue_mut(issue);
            if leader.map_or(false, |l| l != value) {
                for (i, m) in values.iter_mut().enumerate() {
                    if i != value {
                        *m *= decay;
                    }
                }
            }
            values[value] += 1.0 + self.repeat_bonus * f64::from(self.streaks[issue]);
        }

        self.last = Some(bid.clone());
        self.observations += 1;
    }

    fn utility(&self, bid: &Bid) -> f64 {
        self.mass.utility(bid, &self.mass.weights())
    }

    fn issue_weights(&self) -> Vec<f64> {
        self.mass.weights()
    }

    fn observations(&self) -> usize {
        self.observations
    }

    fn name(&self) -> &'static str {
        "recency"
    }
}
