//! Per-opponent statistics carried across sessions
//!
//! Stores deal in opaque blobs and never fail loudly: a load that goes wrong
//! is `None`, a save that goes wrong is `false`. Callers treat both as "no
//! history".

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::negotiation::SessionOutcome;
use crate::types::OpponentId;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Blob storage keyed by opponent
pub trait StatsStore: Send + Sync {
    fn load(&self, opponent: &OpponentId) -> Option<Vec<u8>>;

    fn save(&self, opponent: &OpponentId, blob: &[u8]) -> bool;
}

/// What we remember about an opponent between sessions
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentStats {
    pub sessions: u32,
    pub agreements: u32,
    /// Running mean of our own utility over agreed bids
    pub mean_agreement_utility: f64,
    /// Issue weights learned in the most recent session
    pub last_issue_weights: Vec<f64>,
}

impl OpponentStats {
    /// Load and decode; missing or corrupt blobs yield `None`
    pub fn load(store: &dyn StatsStore, opponent: &OpponentId) -> Option<Self> {
        let blob = store.load(opponent)?;
        match serde_json::from_slice(&blob) {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(opponent = %opponent, error = %e, "discarding unreadable opponent stats");
                None
            }
        }
    }

    /// Encode and save; returns whether the store accepted the blob
    pub fn save(&self, store: &dyn StatsStore, opponent: &OpponentId) -> bool {
        match serde_json::to_vec(self) {
            Ok(blob) => store.save(opponent, &blob),
            Err(e) => {
                warn!(opponent = %opponent, error = %e, "failed to encode opponent stats");
                false
            }
        }
    }

    /// Fold a finished session into the statistics
    pub fn record(&mut self, outcome: &SessionOutcome, issue_weights: Vec<f64>) {
        self.sessions = self.sessions.saturating_add(1);
        if let SessionOutcome::Agreement { utility, .. } = outcome {
            self.agreements = self.agreements.saturating_add(1);
            let n = f64::from(self.agreements);
            self.mean_agreement_utility += (utility - self.mean_agreement_utility) / n;
        }
        self.last_issue_weights = issue_weights;
    }

    /// Share of sessions that ended in agreement
    pub fn agreement_rate(&self) -> f64 {
        if self.sessions == 0 {
            0.0
        } else {
            f64::from(self.agreements) / f64::from(self.sessions)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    fn agreement(utility: f64) -> SessionOutcome {
        let domain = Domain::synthetic(1, 2).unwrap();
        SessionOutcome::Agreement {
            bid: domain.nth_bid(0),
            utility,
            round: 5,
        }
    }

    #[test]
    fn test_running_mean() {
        let mut stats = OpponentStats::default();
        stats.record(&agreement(0.8), vec![0.5, 0.5]);
        stats.record(
            &SessionOutcome::NoAgreement {
                reason: "deadline".to_string(),
            },
            vec![0.7, 0.3],
        );
        stats.record(&agreement(0.6), vec![0.6, 0.4]);

        assert_eq!(stats.sessions, 3);
        assert_eq!(stats.agreements, 2);
        assert!((stats.mean_agreement_utility - 0.7).abs() < 1e-12);
        assert_eq!(stats.last_issue_weights, vec![0.6, 0.4]);
        assert!((stats.agreement_rate() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_through_store() {
        let store = MemoryStore::new();
        let opponent = OpponentId::new("carol");
        assert!(OpponentStats::load(&store, &opponent).is_none());

        let mut stats = OpponentStats::default();
        stats.record(&agreement(0.9), vec![1.0]);
        assert!(stats.save(&store, &opponent));
        assert_eq!(OpponentStats::load(&store, &opponent), Some(stats));
    }

    #[test]
    fn test_corrupt_blob_is_none() {
        let store = MemoryStore::new();
        let opponent = OpponentId::new("mallory");
        assert!(store.save(&opponent, b"{not json"));
        assert!(OpponentStats::load(&store, &opponent).is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let store = MemoryStore::new();
        let opponent = OpponentId::new("dave");
        assert!(store.save(&opponent, br#"{"sessions": 4}"#));
        let stats = OpponentStats::load(&store, &opponent).unwrap();
        assert_eq!(stats.sessions, 4);
        assert_eq!(stats.agreements, 0);
    }
}
