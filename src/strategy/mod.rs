//! Strategy core: concession, bid search and acceptance
//!
//! Bidding and acceptance are injected into a session as trait objects so
//! alternative strategies can be swapped in without touching the driver.

pub mod acceptance;
pub mod bidding;
pub mod bidspace;
pub mod concession;

pub use acceptance::{
    AcceptanceConfig, AcceptanceEngine, Condition, Evidence, Phase, WindowStat,
};
pub use bidding::{BidSelection, BiddingConfig, BiddingEngine};
pub use bidspace::{BidSpaceIndex, IndexConfig, IndexedBid};
pub use concession::{target_utility, ConcessionConfig, ConcessionCurve, CurveShape};

use crate::domain::{Bid, UtilityFunction};
use crate::error::Result;
use crate::negotiation::{BidRecord, History};
use crate::opponent::OpponentModel;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Read-only view of the session handed to strategies each turn
pub struct DecisionContext<'a> {
    /// Negotiation progress in `[0, 1]`
    pub progress: f64,
    pub utility: &'a dyn UtilityFunction,
    pub index: &'a BidSpaceIndex,
    pub opponent: Option<&'a dyn OpponentModel>,
    pub history: &'a History,
}

/// Chooses the bid to offer this turn
pub trait BiddingStrategy: Send {
    /// Next offer; never below the reservation utility
    fn next_bid(&mut self, ctx: &DecisionContext<'_>) -> Result<Bid>;

    /// Target utility the strategy aims for at `progress`
    fn target(&self, progress: f64, reservation: f64) -> f64;

    /// Raise the lowest utility the strategy will concede to
    fn raise_floor(&mut self, floor: f64);
}

/// Decides whether to take the opponent's last offer
pub trait AcceptanceStrategy: Send {
    fn phase(&self, progress: f64) -> Phase;

    /// `planned` is the offer we would send if we reject
    fn accept(
        &self,
        ctx: &DecisionContext<'_>,
        received: Option<&BidRecord>,
        planned: Option<&Bid>,
    ) -> bool;
}

/// Seeded RNG when a seed is given, entropy otherwise
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
