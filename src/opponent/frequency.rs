//! Value-frequency opponent model

use crate::domain::{Bid, Domain};

use super::{OpponentModel, ValueMass};

/// Counts how often each value was offered on each issue
#[derive(Clone, Debug)]
pub struct FrequencyModel {
    counts: ValueMass,
    observations: usize,
}

impl FrequencyModel {
    pub fn new(domain: &Domain) -> Self {
        Self {
            counts: ValueMass::new(domain),
            observations: 0,
        }
    }

    /// Times a value was offered on an issue
    pub fn count(&self, issue: usize, value: usize) -> f64 {
        self.counts.issue(issue)[value]
    }
}

impl OpponentModel for FrequencyModel {
    fn update(&mut self, bid: &Bid) {
        let issues = self.counts.issue_count();
        for (issue, &value) in bid.values().iter().enumerate().take(issues) {
            if let Some(slot) = self.counts.issue_mut(issue).get_mut(value) {
                *slot += 1.0;
            }
        }
        self.observations += 1;
    }

    fn utility(&self, bid: &Bid) -> f64 {
        self.counts.utility(bid, &self.counts.weights())
    }

    fn issue_weights(&self) -> Vec<f64> {
        self.counts.weights()
    }

    fn observations(&self) -> usize {
        self.observations
    }

    fn name(&self) -> &'static str {
        "frequency"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opponent::tests::small_domain;

    #[test]
    fn test_counts_accumulate() {
        let domain = small_domain();
        let mut model = FrequencyModel::new(&domain);
        model.update(&domain.bid(vec![0, 2]).unwrap());
        model.update(&domain.bid(vec![0, 1]).unwrap());

        assert_eq!(model.observations(), 2);
        assert_eq!(model.count(0, 0), 2.0);
        assert_eq!(model.count(1, 2), 1.0);
        assert_eq!(model.count(1, 1), 1.0);
        assert_eq!(model.count(1, 0), 0.0);
    }

    #[test]
    fn test_weights_follow_peakedness() {
        let domain = small_domain();
        let mut model = FrequencyModel::new(&domain);
        for b in [0, 1, 2, 0, 1] {
            model.update(&domain.bid(vec![1, b]).unwrap());
        }
        // a: 5 - 5/3 = 10/3, b: 2 - 5/3 = 1/3
        let weights = model.issue_weights();
        assert!((weights[0] - 10.0 / 11.0).abs() < 1e-9);
        assert!((weights[1] - 1.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_most_offered_bid_scores_highest() {
        let domain = small_domain();
        let mut model = FrequencyModel::new(&domain);
        for b in [0, 1, 2, 0, 1] {
            model.update(&domain.bid(vec![1, b]).unwrap());
        }
        let favourite = model.utility(&domain.bid(vec![1, 0]).unwrap());
        let other = model.utility(&domain.bid(vec![2, 2]).unwrap());
        assert!((favourite - 1.0).abs() < 1e-9);
        assert!(favourite > other);
    }

    #[test]
    fn test_flat_history_is_uniform() {
        let domain = small_domain();
        let mut model = FrequencyModel::new(&domain);
        for v in 0..3 {
            model.update(&domain.bid(vec![v, v]).unwrap());
        }
        assert_eq!(model.issue_weights(), vec![0.5, 0.5]);
    }
}
