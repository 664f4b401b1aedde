//! Utility-sorted index over the bid space
//!
//! Small domains are enumerated in full. Above the enumeration cap the index
//! holds a bounded uniform sample plus the maximum-utility bid, so build and
//! query cost stay independent of the domain size.

use crate::domain::{Bid, UtilityFunction};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Bounds on index construction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Largest bid space that is enumerated exhaustively
    pub enumeration_cap: u64,
    /// Random draws taken when the bid space exceeds the cap
    pub sample_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            enumeration_cap: 50_000,
            sample_size: 10_000,
        }
    }
}

/// A bid with its own utility precomputed
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedBid {
    pub bid: Bid,
    pub utility: f64,
}

/// Bids sorted by own utility, highest first
#[derive(Clone, Debug)]
pub struct BidSpaceIndex {
    entries: Vec<IndexedBid>,
    exhaustive: bool,
}

impl BidSpaceIndex {
    /// Enumerate or sample the bid space of `utility`'s domain
    pub fn build<R: Rng + ?Sized>(
        utility: &dyn UtilityFunction,
        config: &IndexConfig,
        rng: &mut R,
    ) -> Self {
        let domain = utility.domain();
        let size = domain.size();
        let exhaustive = size <= u128::from(config.enumeration_cap);

        let bids: Vec<Bid> = if exhaustive {
            (0..size).map(|i| domain.nth_bid(i)).collect()
        } else {
            let max_bid = utility.max_bid();
            let mut seen = HashSet::with_capacity(config.sample_size + 1);
            let mut bids = Vec::with_capacity(config.sample_size + 1);
            seen.insert(max_bid.clone());
            bids.push(max_bid);
            for _ in 0..config.sample_size {
                let bid = domain.random_bid(rng);
                if seen.insert(bid.clone()) {
                    bids.push(bid);
                }
            }
            bids
        };

        let mut entries: Vec<IndexedBid> = bids
            .into_iter()
            .map(|bid| {
                let u = utility.utility(&bid);
                IndexedBid { bid, utility: u }
            })
            .collect();
        entries.sort_by(|a, b| b.utility.total_cmp(&a.utility));

        tracing::debug!(
            domain = %domain.name,
            size = %size,
            exhaustive,
            entries = entries.len(),
            "built bid space index"
        );

        Self {
            entries,
            exhaustive,
        }
    }

    /// Every indexed bid with `lo <= utility <= hi`, highest first
    pub fn query(&self, lo: f64, hi: f64) -> &[IndexedBid] {
        if lo > hi {
            return &[];
        }
        let start = self.entries.partition_point(|e| e.utility > hi);
        let end = self.entries.partition_point(|e| e.utility >= lo);
        if start >= end {
            return &[];
        }
        &self.entries[start..end]
    }

    /// Highest-utility indexed bid
    pub fn best(&self) -> Option<&IndexedBid> {
        self.entries.first()
    }

    pub fn entries(&self) -> &[IndexedBid] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the whole bid space was enumerated
    pub fn is_exhaustive(&self) -> bool {
        self.exhaustive
    }

    pub fn contains(&self, bid: &Bid) -> bool {
        self.entries.iter().any(|e| &e.bid == bid)
    }
}
