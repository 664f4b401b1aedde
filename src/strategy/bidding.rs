//! Counter-offer selection
//!
//! The concession curve sets a target utility, the bid space index supplies
//! the bids near that target, and the opponent model ranks them. Search is
//! bounded both in candidates evaluated and in wall-clock time.

use crate::domain::Bid;
use crate::error::{ParleyError, Result};
use crate::opponent::OpponentModel;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::bidspace::{BidSpaceIndex, IndexedBid};
use super::concession::ConcessionCurve;
use super::{BiddingStrategy, DecisionContext};

/// How candidates near the target are ranked
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BidSelection {
    /// Maximize the opponent's estimated utility
    Opponent,
    /// `alpha * own + (1 - alpha) * opponent`
    Weighted { alpha: f64 },
    /// `(own - reservation) * opponent`
    Nash,
    /// Uniformly random candidate
    Random,
}

impl Default for BidSelection {
    fn default() -> Self {
        BidSelection::Weighted { alpha: 0.5 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiddingConfig {
    pub selection: BidSelection,
    /// Half-width of the utility band around the target
    pub initial_delta: f64,
    /// Band growth toward the top of the index when the band is empty
    pub widen_step: f64,
    /// Most candidates scored per turn
    pub max_candidates: usize,
    /// Candidates considered when avoiding a repeated offer
    pub top_k: usize,
    /// Own-utility slack for a replacement of a repeated offer
    pub repeat_tolerance: f64,
    /// Wall-clock budget for scoring candidates
    pub time_budget_ms: u64,
}

impl Default for BiddingConfig {
    fn default() -> Self {
        Self {
            selection: BidSelection::default(),
            initial_delta: 0.02,
            widen_step: 0.02,
            max_candidates: 500,
            top_k: 3,
            repeat_tolerance: 0.02,
            time_budget_ms: 200,
        }
    }
}

/// Scored candidate
#[derive(Clone, Copy, Debug)]
struct Scored<'a> {
    entry: &'a IndexedBid,
    score: f64,
}

/// Default bidding strategy
pub struct BiddingEngine {
    curve: ConcessionCurve,
    config: BiddingConfig,
    rng: StdRng,
    rotation: usize,
}

impl BiddingEngine {
    pub fn new(curve: ConcessionCurve, config: BiddingConfig, rng: StdRng) -> Self {
        Self {
            curve,
            config,
            rng,
            rotation: 0,
        }
    }

    pub fn curve(&self) -> &ConcessionCurve {
        &self.curve
    }

    /// Bids in the band around `target`, widened toward the top of the index
    /// until non-empty, falling back to the best indexed bid.
    fn candidates<'a>(&self, index: &'a BidSpaceIndex, target: f64, floor: f64) -> &'a [IndexedBid] {
        let top = index.best().map_or(1.0, |b| b.utility);
        let lo = (target - self.config.initial_delta).max(floor);
        let mut hi = target + self.config.initial_delta;

        loop {
            let band = index.query(lo, hi);
            if !band.is_empty() {
                return band;
            }
            if hi >= top || self.config.widen_step <= 0.0 {
                break;
            }
            hi = (hi + self.config.widen_step).min(top);
        }

        tracing::debug!(target, lo, "utility band empty, falling back to best bid");
        index.entries().get(..1).unwrap_or(&[])
    }

    fn score(&self, entry: &IndexedBid, opponent: &dyn OpponentModel, reservation: f64) -> f64 {
        let theirs = opponent.utility(&entry.bid);
        match self.config.selection {
            BidSelection::Opponent => theirs,
            BidSelection::Weighted { alpha } => alpha * entry.utility + (1.0 - alpha) * theirs,
            BidSelection::Nash => (entry.utility - reservation).max(0.0) * theirs,
            BidSelection::Random => 0.0,
        }
    }

    fn pick_random(&mut self, candidates: &[IndexedBid], last_own: Option<&Bid>) -> Bid {
        let mut i = self.rng.gen_range(0..candidates.len());
        if candidates.len() > 1 && Some(&candidates[i].bid) == last_own {
            i = (i + 1) % candidates.len();
        }
        candidates[i].bid.clone()
    }

    /// Score a bounded subset of candidates, best first.
    ///
    /// Ties keep discovery order so the first candidate found at the maximum
    /// wins.
    fn rank<'a>(
        &mut self,
        candidates: &'a [IndexedBid],
        opponent: &dyn OpponentModel,
        reservation: f64,
    ) -> Vec<Scored<'a>> {
        let limit = self.config.max_candidates.max(1);
        let positions: Vec<usize> = if candidates.len() <= limit {
            (0..candidates.len()).collect()
        } else {
            let mut picked =
                rand::seq::index::sample(&mut self.rng, candidates.len(), limit).into_vec();
            picked.sort_unstable();
            picked
        };

        let started = Instant::now();
        let budget = Duration::from_millis(self.config.time_budget_ms);
        let mut scored = Vec::with_capacity(positions.len());
        for (n, &pos) in positions.iter().enumerate() {
            if n > 0 && n % 32 == 0 && started.elapsed() > budget {
                tracing::warn!(
                    evaluated = n,
                    candidates = positions.len(),
                    "decision budget exhausted, using best candidate so far"
                );
                break;
            }
            let entry = &candidates[pos];
            scored.push(Scored {
                entry,
                score: self.score(entry, opponent, reservation),
            });
        }

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    /// Best candidate, rotating through near-equal alternatives instead of
    /// repeating the previous offer.
    fn choose(&mut self, ranked: &[Scored<'_>], last_own: Option<&Bid>) -> Option<Bid> {
        let best = ranked.first()?;
        if Some(&best.entry.bid) != last_own {
            return Some(best.entry.bid.clone());
        }

        let alternatives: Vec<&Scored<'_>> = ranked
            .iter()
            .skip(1)
            .take(self.config.top_k.saturating_sub(1))
            .filter(|c| (c.entry.utility - best.entry.utility).abs() <= self.config.repeat_tolerance)
            .collect();
        if alternatives.is_empty() {
            return Some(best.entry.bid.clone());
        }

        let pick = alternatives[self.rotation % alternatives.len()];
        self.rotation = self.rotation.wrapping_add(1);
        Some(pick.entry.bid.clone())
    }
}

impl BiddingStrategy for BiddingEngine {
    fn next_bid(&mut self, ctx: &DecisionContext<'_>) -> Result<Bid> {
        let reservation = ctx.utility.reservation();
        let best = ctx.index.best().ok_or(ParleyError::NegotiationImpossible {
            reservation,
            best: 0.0,
        })?;
        if best.utility < reservation {
            return Err(ParleyError::NegotiationImpossible {
                reservation,
                best: best.utility,
            });
        }

        let curve = self.curve.with_floor(reservation);
        let target = curve.target(ctx.progress);
        let candidates = self.candidates(ctx.index, target, curve.min_utility());
        let last_own = ctx.history.last_sent().map(|r| &r.bid);

        let model = ctx.opponent.filter(|m| m.observations() > 0);
        let bid = match model {
            Some(model) if self.config.selection != BidSelection::Random => {
                let ranked = self.rank(candidates, model, reservation);
                self.choose(&ranked, last_own)
            }
            _ if candidates.is_empty() => None,
            _ => Some(self.pick_random(candidates, last_own)),
        };
        let bid = bid.unwrap_or_else(|| best.bid.clone());

        tracing::debug!(
            progress = ctx.progress,
            target,
            candidates = candidates.len(),
            utility = ctx.utility.utility(&bid),
            "selected counter-offer"
        );
        Ok(bid)
    }

    fn target(&self, progress: f64, reservation: f64) -> f64 {
        self.curve.with_floor(reservation).target(progress)
    }

    fn raise_floor(&mut self, floor: f64) {
        self.curve = self.curve.with_floor(floor);
    }
}
