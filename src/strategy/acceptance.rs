//! Acceptance conditions and negotiation phases
//!
//! Conditions are OR-combined. The reservation check is applied before any
//! of them and cannot be configured away.

use crate::domain::Bid;
use crate::error::{ParleyError, Result};
use crate::negotiation::BidRecord;
use serde::{Deserialize, Serialize};

use super::{AcceptanceStrategy, DecisionContext};

/// Statistic over a window of received utilities
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStat {
    Max,
    Avg,
}

/// A single acceptance predicate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Accept once progress reaches `threshold`
    Time { threshold: f64 },
    /// Accept when `scale * received + gap` covers our planned offer
    Next { scale: f64, gap: f64 },
    /// Accept anything worth at least `threshold`
    Const { threshold: f64 },
    /// Accept when the offer matches the statistic of the last `size` offers
    Window { size: usize, stat: WindowStat },
}

/// Utilities a condition is evaluated against
#[derive(Clone, Copy, Debug)]
pub struct Evidence<'a> {
    pub progress: f64,
    /// Own utility of the received bid
    pub received: f64,
    /// Own utility of the offer we would send instead
    pub planned: Option<f64>,
    /// Own utilities of received bids, oldest first, including this one
    pub window: &'a [f64],
}

impl Condition {
    pub fn holds(&self, evidence: &Evidence<'_>) -> bool {
        match *self {
            Condition::Time { threshold } => evidence.progress >= threshold,
            Condition::Next { scale, gap } => evidence
                .planned
                .map_or(false, |planned| scale * evidence.received + gap >= planned),
            Condition::Const { threshold } => evidence.received >= threshold,
            Condition::Window { size, stat } => {
                let start = evidence.window.len().saturating_sub(size);
                let recent = &evidence.window[start..];
                if recent.is_empty() {
                    return false;
                }
                let reference = match stat {
                    WindowStat::Max => recent.iter().cloned().fold(f64::MIN, f64::max),
                    WindowStat::Avg => recent.iter().sum::<f64>() / recent.len() as f64,
                };
                evidence.received >= reference
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ok = match *self {
            Condition::Time { threshold } | Condition::Const { threshold } => {
                (0.0..=1.0).contains(&threshold)
            }
            Condition::Next { scale, gap } => scale.is_finite() && scale > 0.0 && gap.is_finite(),
            Condition::Window { size, .. } => size > 0,
        };
        if ok {
            Ok(())
        } else {
            Err(ParleyError::InvalidConfig(format!(
                "invalid acceptance condition {:?}",
                self
            )))
        }
    }
}

/// Where the negotiation stands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Warm-up: every offer is rejected while the opponent model seeds
    Exploring,
    /// Conditions are evaluated normally
    Bidding,
    /// Near the deadline: the best offer seen so far is also taken
    Closing,
    /// Agreement reached or deadline passed
    Terminal,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Terminal)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptanceConfig {
    /// Progress below which every offer is rejected
    pub warmup: f64,
    /// Progress from which the closing relaxation applies
    pub closing: f64,
    pub conditions: Vec<Condition>,
    /// Accept the best offer received so far once closing
    pub accept_best_when_closing: bool,
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self {
            warmup: 0.05,
            closing: 0.95,
            conditions: vec![
                Condition::Next {
                    scale: 1.0,
                    gap: 0.0,
                },
                Condition::Const { threshold: 0.95 },
            ],
            accept_best_when_closing: true,
        }
    }
}

impl AcceptanceConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.warmup)
            || !(0.0..=1.0).contains(&self.closing)
            || self.warmup > self.closing
        {
            return Err(ParleyError::InvalidConfig(format!(
                "acceptance phases must satisfy 0 <= warmup ({}) <= closing ({}) <= 1",
                self.warmup, self.closing
            )));
        }
        self.conditions.iter().try_for_each(Condition::validate)
    }
}

/// Default acceptance strategy
#[derive(Clone, Debug)]
pub struct AcceptanceEngine {
    config: AcceptanceConfig,
}

impl AcceptanceEngine {
    pub fn new(config: AcceptanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AcceptanceConfig {
        &self.config
    }

    /// Pure decision over precomputed utilities.
    ///
    /// `best_received` is the best own utility among received bids,
    /// including the current one.
    pub fn evaluate(&self, evidence: &Evidence<'_>, reservation: f64, best_received: f64) -> bool {
        if evidence.received < reservation {
            return false;
        }

        let any = || self.config.conditions.iter().any(|c| c.holds(evidence));
        match self.phase(evidence.progress) {
            Phase::Exploring | Phase::Terminal => false,
            Phase::Bidding => any(),
            Phase::Closing => {
                any() || (self.config.accept_best_when_closing && evidence.received >= best_received)
            }
        }
    }
}

impl AcceptanceStrategy for AcceptanceEngine {
    fn phase(&self, progress: f64) -> Phase {
        if progress >= 1.0 {
            Phase::Terminal
        } else if progress < self.config.warmup {
            Phase::Exploring
        } else if progress >= self.config.closing {
            Phase::Closing
        } else {
            Phase::Bidding
        }
    }

    fn accept(
        &self,
        ctx: &DecisionContext<'_>,
        received: Option<&BidRecord>,
        planned: Option<&Bid>,
    ) -> bool {
        let Some(received) = received else {
            return false;
        };

        let window = ctx.history.received_utilities();
        let best_received = window.iter().cloned().fold(received.own_utility, f64::max);
        let evidence = Evidence {
            progress: ctx.progress,
            received: received.own_utility,
            planned: planned.map(|b| ctx.utility.utility(b)),
            window: &window,
        };

        let accepted = self.evaluate(&evidence, ctx.utility.reservation(), best_received);
        tracing::debug!(
            progress = ctx.progress,
            received = received.own_utility,
            planned = ?evidence.planned,
            phase = ?self.phase(ctx.progress),
            accepted,
            "acceptance decision"
        );
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Domain, LinearAdditiveUtility, UtilityFunction};
    use crate::negotiation::History;
    use crate::strategy::bidspace::{BidSpaceIndex, IndexConfig};
    use crate::types::Party;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn evidence(progress: f64, received: f64, planned: Option<f64>) -> Evidence<'static> {
        Evidence {
            progress,
            received,
            planned,
            window: &[],
        }
    }

    #[test]
    fn test_ac_next() {
        let next = Condition::Next {
            scale: 1.0,
            gap: 0.0,
        };
        assert!(next.holds(&evidence(0.5, 0.8, Some(0.75))));
        assert!(!next.holds(&evidence(0.5, 0.8, Some(0.85))));
        assert!(!next.holds(&evidence(0.5, 0.8, None)));

        let generous = Condition::Next {
            scale: 1.0,
            gap: 0.1,
        };
        assert!(generous.holds(&evidence(0.5, 0.8, Some(0.85))));
    }

    #[test]
    fn test_ac_time_and_const() {
        let time = Condition::Time { threshold: 0.9 };
        assert!(!time.holds(&evidence(0.89, 0.1, None)));
        assert!(time.holds(&evidence(0.9, 0.1, None)));

        let constant = Condition::Const { threshold: 0.7 };
        assert!(constant.holds(&evidence(0.1, 0.7, None)));
        assert!(!constant.holds(&evidence(0.1, 0.69, None)));
    }

    #[test]
    fn test_ac_window() {
        let window = [0.9, 0.2, 0.4, 0.5, 0.6];
        let ev = Evidence {
            progress: 0.5,
            received: 0.6,
            planned: None,
            window: &window,
        };
        // last 3: 0.4, 0.5, 0.6
        assert!(Condition::Window {
            size: 3,
            stat: WindowStat::Max
        }
        .holds(&ev));
        assert!(!Condition::Window {
            size: 5,
            stat: WindowStat::Max
        }
        .holds(&ev));
        // avg of all five = 0.52
        assert!(Condition::Window {
            size: 20,
            stat: WindowStat::Avg
        }
        .holds(&ev));
        assert!(!Condition::Window {
            size: 3,
            stat: WindowStat::Max
        }
        .holds(&evidence(0.5, 0.6, None)));
    }

    #[test]
    fn test_phases() {
        let engine = AcceptanceEngine::new(AcceptanceConfig::default());
        assert_eq!(engine.phase(0.0), Phase::Exploring);
        assert_eq!(engine.phase(0.5), Phase::Bidding);
        assert_eq!(engine.phase(0.97), Phase::Closing);
        assert_eq!(engine.phase(1.0), Phase::Terminal);
        assert!(engine.phase(1.0).is_terminal());
    }

    #[test]
    fn test_exploring_rejects_everything() {
        let engine = AcceptanceEngine::new(AcceptanceConfig::default());
        assert!(!engine.evaluate(&evidence(0.01, 1.0, Some(0.5)), 0.0, 1.0));
        assert!(engine.evaluate(&evidence(0.5, 1.0, Some(0.5)), 0.0, 1.0));
    }

    #[test]
    fn test_reservation_overrides_conditions() {
        let engine = AcceptanceEngine::new(AcceptanceConfig {
            conditions: vec![Condition::Time { threshold: 0.0 }],
            ..AcceptanceConfig::default()
        });
        assert!(!engine.evaluate(&evidence(0.5, 0.3, Some(0.1)), 0.4, 0.3));
        assert!(engine.evaluate(&evidence(0.5, 0.4, Some(0.1)), 0.4, 0.4));
    }

    #[test]
    fn test_closing_accepts_best_seen() {
        let engine = AcceptanceEngine::new(AcceptanceConfig {
            conditions: vec![],
            ..AcceptanceConfig::default()
        });
        assert!(!engine.evaluate(&evidence(0.5, 0.6, Some(0.9)), 0.3, 0.6));
        assert!(engine.evaluate(&evidence(0.96, 0.6, Some(0.9)), 0.3, 0.6));
        assert!(!engine.evaluate(&evidence(0.96, 0.5, Some(0.9)), 0.3, 0.6));
        assert!(!engine.evaluate(&evidence(0.96, 0.2, Some(0.9)), 0.3, 0.2));
    }

    #[test]
    fn test_config_validation() {
        assert!(AcceptanceConfig::default().validate().is_ok());
        let bad_phases = AcceptanceConfig {
            warmup: 0.9,
            closing: 0.5,
            ..AcceptanceConfig::default()
        };
        assert!(bad_phases.validate().is_err());
        let bad_window = AcceptanceConfig {
            conditions: vec![Condition::Window {
                size: 0,
                stat: WindowStat::Avg,
            }],
            ..AcceptanceConfig::default()
        };
        assert!(bad_window.validate().is_err());
    }

    #[test]
    fn test_condition_serialization() {
        let parsed: Vec<Condition> = serde_json::from_str(
            r#"[
                { "kind": "time", "threshold": 0.98 },
                { "kind": "window", "size": 20, "stat": "avg" }
            ]"#,
        )
        .unwrap();
        assert_eq!(parsed[0], Condition::Time { threshold: 0.98 });
        assert_eq!(
            parsed[1],
            Condition::Window {
                size: 20,
                stat: WindowStat::Avg
            }
        );
    }

    fn fixture() -> (LinearAdditiveUtility, BidSpaceIndex) {
        let mut rng = StdRng::seed_from_u64(21);
        let domain = Domain::synthetic(3, 3).unwrap();
        let utility = LinearAdditiveUtility::random(domain, 0.4, &mut rng).unwrap();
        let index = BidSpaceIndex::build(&utility, &IndexConfig::default(), &mut rng);
        (utility, index)
    }

    #[test]
    fn test_accept_none_is_false() {
        let (utility, index) = fixture();
        let history = History::default();
        let engine = AcceptanceEngine::new(AcceptanceConfig {
            conditions: vec![Condition::Time { threshold: 0.0 }],
            ..AcceptanceConfig::default()
        });
        let ctx = DecisionContext {
            progress: 0.5,
            utility: &utility,
            index: &index,
            opponent: None,
            history: &history,
        };
        assert!(!engine.accept(&ctx, None, Some(&utility.max_bid())));
    }

    proptest! {
        #[test]
        fn never_accepts_below_reservation(progress in 0.0f64..1.0, pick in 0usize..27) {
            let (utility, index) = fixture();
            let engine = AcceptanceEngine::new(AcceptanceConfig {
                warmup: 0.0,
                conditions: vec![
                    Condition::Time { threshold: 0.0 },
                    Condition::Const { threshold: 0.0 },
                ],
                ..AcceptanceConfig::default()
            });
            let bid = utility.domain().nth_bid(pick as u128);
            let mut history = History::default();
            history.append(BidRecord {
                bid: bid.clone(),
                own_utility: utility.utility(&bid),
                opponent_utility: 0.0,
                round: 0,
                progress,
                sender: Party::Opponent,
            });
            let ctx = DecisionContext {
                progress,
                utility: &utility,
                index: &index,
                opponent: None,
                history: &history,
            };
            let accepted = engine.accept(&ctx, history.last_received(), None);
            if utility.utility(&bid) < utility.reservation() {
                prop_assert!(!accepted);
            } else {
                prop_assert!(accepted);
            }
        }
    }
}
