//! Append-only record of every bid exchanged in a session

use crate::domain::Bid;
use crate::types::Party;
use serde::{Deserialize, Serialize};

/// One exchanged bid, frozen at the moment it was sent or received
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BidRecord {
    pub bid: Bid,
    pub own_utility: f64,
    /// Opponent model estimate when the record was made
    pub opponent_utility: f64,
    pub round: u32,
    pub progress: f64,
    pub sender: Party,
}

/// Bid history of a session
#[derive(Clone, Debug, Default)]
pub struct History {
    records: Vec<BidRecord>,
}

impl History {
    /// Append a record; existing records are never touched
    pub fn append(&mut self, record: BidRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[BidRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Opponent bids, oldest first
    pub fn received(&self) -> impl Iterator<Item = &BidRecord> {
        self.records.iter().filter(|r| r.sender == Party::Opponent)
    }

    /// Our own bids, oldest first
    pub fn sent(&self) -> impl Iterator<Item = &BidRecord> {
        self.records.iter().filter(|r| r.sender == Party::Own)
    }

    pub fn last_received(&self) -> Option<&BidRecord> {
        self.records.iter().rev().find(|r| r.sender == Party::Opponent)
    }

    pub fn last_sent(&self) -> Option<&BidRecord> {
        self.records.iter().rev().find(|r| r.sender == Party::Own)
    }

    /// Received bid with the highest own utility (earliest on ties)
    pub fn best_received(&self) -> Option<&BidRecord> {
        self.received().fold(None, |best: Option<&BidRecord>, r| match best {
            Some(b) if b.own_utility >= r.own_utility => Some(b),
            _ => Some(r),
        })
    }

    /// Own utilities of all received bids, oldest first
    pub fn received_utilities(&self) -> Vec<f64> {
        self.received().map(|r| r.own_utility).collect()
    }

    /// Own utilities of the last `size` received bids, oldest first
    pub fn received_window(&self, size: usize) -> Vec<f64> {
        let all = self.received_utilities();
        let start = all.len().saturating_sub(size);
        all[start..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    fn record(domain: &Domain, index: u128, utility: f64, sender: Party) -> BidRecord {
        BidRecord {
            bid: domain.nth_bid(index),
            own_utility: utility,
            opponent_utility: 0.0,
            round: index as u32,
            progress: 0.0,
            sender,
        }
    }

    #[test]
    fn test_history_queries() {
        let domain = Domain::synthetic(2, 3).unwrap();
        let mut history = History::default();
        history.append(record(&domain, 0, 0.9, Party::Own));
        history.append(record(&domain, 1, 0.3, Party::Opponent));
        history.append(record(&domain, 2, 0.8, Party::Own));
        history.append(record(&domain, 3, 0.5, Party::Opponent));
        history.append(record(&domain, 4, 0.5, Party::Opponent));

        assert_eq!(history.len(), 5);
        assert_eq!(history.sent().count(), 2);
        assert_eq!(history.received().count(), 3);
        assert_eq!(history.last_sent().unwrap().bid, domain.nth_bid(2));
        assert_eq!(history.last_received().unwrap().bid, domain.nth_bid(4));
        // earliest of the two 0.5 offers
        assert_eq!(history.best_received().unwrap().bid, domain.nth_bid(3));
        assert_eq!(history.received_utilities(), vec![0.3, 0.5, 0.5]);
        assert_eq!(history.received_window(2), vec![0.5, 0.5]);
        assert_eq!(history.received_window(10).len(), 3);
    }

    #[test]
    fn test_empty_history() {
        let history = History::default();
        assert!(history.is_empty());
        assert!(history.last_received().is_none());
        assert!(history.best_received().is_none());
        assert!(history.received_window(5).is_empty());
    }
}
