//! Private utility functions over bids

use crate::error::{ParleyError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::bid::{Bid, Domain};

/// An agent's private valuation of bids
///
/// Implementations must be pure: the same bid always maps to the same value
/// in `[0, 1]`, and `utility(max_bid())` is 1.
pub trait UtilityFunction: Send + Sync {
    /// Domain the function is defined over
    fn domain(&self) -> &Domain;

    /// Utility of a bid in `[0, 1]`
    fn utility(&self, bid: &Bid) -> f64;

    /// Utility of walking away without agreement
    fn reservation(&self) -> f64 {
        0.0
    }

    /// A bid with maximal utility
    fn max_bid(&self) -> Bid;
}

/// Profile file layout for [`LinearAdditiveUtility`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProfileDescription {
    /// Issue id to relative weight; missing issues weigh 0
    pub weights: HashMap<String, f64>,
    /// Issue id to value label to evaluation; missing values evaluate to 0
    pub evaluations: HashMap<String, HashMap<String, f64>>,
    #[serde(default)]
    pub reservation: Option<f64>,
}

/// Linear-additive utility: weighted sum of per-issue value evaluations
#[derive(Clone, Debug)]
pub struct LinearAdditiveUtility {
    domain: Domain,
    weights: Vec<f64>,
    evaluations: Vec<Vec<f64>>,
    reservation: f64,
    max_bid: Bid,
    max_raw: f64,
}

impl LinearAdditiveUtility {
    /// Build from raw weights and evaluations.
    ///
    /// Weights are normalized to sum to 1 and each issue's evaluations are
    /// scaled so its best value scores 1.
    pub fn new(
        domain: Domain,
        weights: Vec<f64>,
        evaluations: Vec<Vec<f64>>,
        reservation: f64,
    ) -> Result<Self> {
        domain.validate()?;

        if weights.len() != domain.issue_count() || evaluations.len() != domain.issue_count() {
            return Err(ParleyError::InvalidProfile(format!(
                "expected {} issues, got {} weights and {} evaluation sets",
                domain.issue_count(),
                weights.len(),
                evaluations.len()
            )));
        }
        if !(0.0..=1.0).contains(&reservation) {
            return Err(ParleyError::InvalidProfile(format!(
                "reservation {} outside [0, 1]",
                reservation
            )));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ParleyError::InvalidProfile(
                "weights must be finite and non-negative".to_string(),
            ));
        }

        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(ParleyError::InvalidProfile(
                "weights sum to zero".to_string(),
            ));
        }
        let weights: Vec<f64> = weights.iter().map(|w| w / total).collect();

        let mut normalized = Vec::with_capacity(evaluations.len());
        for (issue, evals) in domain.issues.iter().zip(evaluations) {
            if evals.len() != issue.values.len() {
                return Err(ParleyError::InvalidProfile(format!(
                    "issue '{}' has {} values but {} evaluations",
                    issue.id,
                    issue.values.len(),
                    evals.len()
                )));
            }
            if evals.iter().any(|e| !e.is_finite() || *e < 0.0) {
                return Err(ParleyError::InvalidProfile(format!(
                    "issue '{}' has a negative or non-finite evaluation",
                    issue.id
                )));
            }
            let best = evals.iter().cloned().fold(0.0, f64::max);
            if best > 0.0 {
                normalized.push(evals.iter().map(|e| e / best).collect());
            } else {
                normalized.push(evals);
            }
        }

        let max_bid = domain.bid(argmax(&normalized))?;
        let mut utility = Self {
            domain,
            weights,
            evaluations: normalized,
            reservation,
            max_bid,
            max_raw: 1.0,
        };

        // Same summation order as utility(), so the max bid scores exactly 1
        let max_raw = utility.raw(&utility.max_bid);
        if max_raw <= 0.0 {
            return Err(ParleyError::InvalidProfile(
                "every weighted issue evaluates to zero".to_string(),
            ));
        }
        utility.max_raw = max_raw;

        Ok(utility)
    }

    /// Build from a profile description keyed by issue and value labels
    pub fn from_profile(domain: Domain, profile: &ProfileDescription) -> Result<Self> {
        for key in profile.weights.keys().chain(profile.evaluations.keys()) {
            if domain.issue_index(key).is_none() {
                return Err(ParleyError::InvalidProfile(format!(
                    "profile mentions unknown issue '{}'",
                    key
                )));
            }
        }

        let weights = domain
            .issues
            .iter()
            .map(|issue| profile.weights.get(&issue.id).copied().unwrap_or(0.0))
            .collect();

        let mut evaluations = Vec::with_capacity(domain.issue_count());
        for issue in &domain.issues {
            let table = profile.evaluations.get(&issue.id);
            if let Some(table) = table {
                if let Some(unknown) = table.keys().find(|k| issue.value_index(k).is_none()) {
                    return Err(ParleyError::InvalidProfile(format!(
                        "unknown value '{}' for issue '{}'",
                        unknown, issue.id
                    )));
                }
            }
            evaluations.push(
                issue
                    .values
                    .iter()
                    .map(|v| table.and_then(|t| t.get(v)).copied().unwrap_or(0.0))
                    .collect(),
            );
        }

        Self::new(
            domain,
            weights,
            evaluations,
            profile.reservation.unwrap_or(0.0),
        )
    }

    /// Load a profile description from disk
    pub fn from_file(domain: Domain, path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let profile: ProfileDescription = serde_json::from_str(&raw)?;
        Self::from_profile(domain, &profile)
    }

    /// Random profile, used for simulations
    pub fn random<R: Rng + ?Sized>(domain: Domain, reservation: f64, rng: &mut R) -> Result<Self> {
        let weights = domain
            .issues
            .iter()
            .map(|_| rng.gen_range(0.05..1.0))
            .collect();
        let evaluations = domain
            .issues
            .iter()
            .map(|issue| {
                let mut evals: Vec<f64> =
                    issue.values.iter().map(|_| rng.gen_range(0.0..1.0)).collect();
                let best = rng.gen_range(0..evals.len());
                evals[best] = 1.0;
                evals
            })
            .collect();
        Self::new(domain, weights, evaluations, reservation)
    }

    /// Normalized issue weights
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Normalized evaluation of a value on an issue
    pub fn evaluation(&self, issue: usize, value: usize) -> f64 {
        self.evaluations[issue][value]
    }

    fn raw(&self, bid: &Bid) -> f64 {
        self.weights
            .iter()
            .zip(&self.evaluations)
            .zip(bid.values())
            .map(|((w, evals), &v)| w * evals.get(v).copied().unwrap_or(0.0))
            .sum()
    }
}

impl UtilityFunction for LinearAdditiveUtility {
    fn domain(&self) -> &Domain {
        &self.domain
    }

    fn utility(&self, bid: &Bid) -> f64 {
        (self.raw(bid) / self.max_raw).clamp(0.0, 1.0)
    }

    fn reservation(&self) -> f64 {
        self.reservation
    }

    fn max_bid(&self) -> Bid {
        self.max_bid.clone()
    }
}

/// Best-evaluated value position per issue (first on ties)
fn argmax(evaluations: &[Vec<f64>]) -> Vec<usize> {
    evaluations
        .iter()
        .map(|evals| {
            let mut best = 0;
            for (i, e) in evals.iter().enumerate() {
                if *e > evals[best] {
                    best = i;
                }
            }
            best
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Issue;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fruit_domain() -> Domain {
        Domain::new(
            "fruit",
            vec![
                Issue::new("fruit", &["apple", "pear", "plum"]),
                Issue::new("amount", &["1kg", "2kg"]),
            ],
        )
        .unwrap()
    }

    fn fruit_profile() -> LinearAdditiveUtility {
        LinearAdditiveUtility::new(
            fruit_domain(),
            vec![3.0, 1.0],
            vec![vec![0.2, 1.0, 0.5], vec![4.0, 2.0]],
            0.3,
        )
        .unwrap()
    }

    #[test]
    fn test_normalization() {
        let u = fruit_profile();
        assert!((u.weights()[0] - 0.75).abs() < 1e-12);
        assert!((u.weights()[1] - 0.25).abs() < 1e-12);
        assert_eq!(u.evaluation(1, 0), 1.0);
        assert_eq!(u.evaluation(1, 1), 0.5);
    }

    #[test]
    fn test_max_bid_has_utility_one() {
        let u = fruit_profile();
        let max = u.max_bid();
        assert_eq!(max.values(), &[1, 0]);
        assert_eq!(u.utility(&max), 1.0);
        assert_eq!(u.reservation(), 0.3);
    }

    #[test]
    fn test_utility_values() {
        let u = fruit_profile();
        let bid = u.domain().bid_from_labels(&["plum", "2kg"]).unwrap();
        // 0.75 * 0.5 + 0.25 * 0.5
        assert!((u.utility(&bid) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_from_profile() {
        let json = r#"{
            "weights": { "fruit": 2, "amount": 2 },
            "evaluations": {
                "fruit": { "apple": 1, "pear": 0.5 },
                "amount": { "1kg": 0.25, "2kg": 1 }
            },
            "reservation": 0.4
        }"#;
        let profile: ProfileDescription = serde_json::from_str(json).unwrap();
        let u = LinearAdditiveUtility::from_profile(fruit_domain(), &profile).unwrap();
        let plum = u.domain().bid_from_labels(&["plum", "1kg"]).unwrap();
        // plum missing => 0; 1kg => 0.25
        assert!((u.utility(&plum) - 0.125).abs() < 1e-12);
        assert_eq!(u.utility(&u.max_bid()), 1.0);
        assert_eq!(u.reservation(), 0.4);
    }

    #[test]
    fn test_rejects_bad_profiles() {
        let d = fruit_domain();
        assert!(LinearAdditiveUtility::new(d.clone(), vec![1.0], vec![], 0.0).is_err());
        assert!(LinearAdditiveUtility::new(
            d.clone(),
            vec![0.0, 0.0],
            vec![vec![1.0, 1.0, 1.0], vec![1.0, 1.0]],
            0.0
        )
        .is_err());
        assert!(LinearAdditiveUtility::new(
            d.clone(),
            vec![1.0, -1.0],
            vec![vec![1.0, 1.0, 1.0], vec![1.0, 1.0]],
            0.0
        )
        .is_err());
        assert!(LinearAdditiveUtility::new(
            d.clone(),
            vec![1.0, 1.0],
            vec![vec![1.0, 1.0, 1.0], vec![1.0, 1.0]],
            1.5
        )
        .is_err());

        let mut profile = ProfileDescription::default();
        profile.weights.insert("colour".to_string(), 1.0);
        assert!(matches!(
            LinearAdditiveUtility::from_profile(d, &profile),
            Err(ParleyError::InvalidProfile(_))
        ));
    }

    proptest! {
        #[test]
        fn utility_stays_in_unit_interval(seed in any::<u64>(), issues in 1usize..8, values in 1usize..6) {
            let mut rng = StdRng::seed_from_u64(seed);
            let domain = Domain::synthetic(issues, values).unwrap();
            let u = LinearAdditiveUtility::random(domain, 0.0, &mut rng).unwrap();
            prop_assert_eq!(u.utility(&u.max_bid()), 1.0);
            for _ in 0..32 {
                let bid = u.domain().random_bid(&mut rng);
                let value = u.utility(&bid);
                prop_assert!((0.0..=1.0).contains(&value));
            }
        }
    }
}
