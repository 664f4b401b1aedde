//! Issues, domains and bids

use crate::error::{ParleyError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// A negotiable issue with its discrete value set
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub values: Vec<String>,
}

impl Issue {
    pub fn new(id: impl Into<String>, values: &[&str]) -> Self {
        Self {
            id: id.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Position of a value label within this issue
    pub fn value_index(&self, label: &str) -> Option<usize> {
        self.values.iter().position(|v| v == label)
    }
}

/// Set of issues under negotiation
///
/// Deserializes from the `{ "issues": [ { "id", "values" } ] }` description.
/// Construct through [`Domain::new`] or [`Domain::from_json`] so the issue
/// list is validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(default)]
    pub name: String,
    pub issues: Vec<Issue>,
}

impl Domain {
    /// Create a validated domain
    pub fn new(name: impl Into<String>, issues: Vec<Issue>) -> Result<Self> {
        let domain = Self {
            name: name.into(),
            issues,
        };
        domain.validate()?;
        Ok(domain)
    }

    /// Parse and validate a domain description
    pub fn from_json(json: &str) -> Result<Self> {
        let domain: Domain = serde_json::from_str(json)?;
        domain.validate()?;
        Ok(domain)
    }

    /// Load a domain description from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Generate a synthetic domain with `issues` issues of `values` values each
    pub fn synthetic(issues: usize, values: usize) -> Result<Self> {
        let issues = (0..issues)
            .map(|i| Issue {
                id: format!("issue_{}", i),
                values: (0..values).map(|v| format!("v{}", v)).collect(),
            })
            .collect();
        Self::new("synthetic", issues)
    }

    /// Check the domain can be negotiated over
    pub fn validate(&self) -> Result<()> {
        if self.issues.is_empty() {
            return Err(ParleyError::InvalidDomain(
                "domain has no issues".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for issue in &self.issues {
            if !seen.insert(issue.id.as_str()) {
                return Err(ParleyError::InvalidDomain(format!(
                    "duplicate issue '{}'",
                    issue.id
                )));
            }
            if issue.values.is_empty() {
                return Err(ParleyError::InvalidDomain(format!(
                    "issue '{}' has no values",
                    issue.id
                )));
            }
            let distinct: HashSet<&str> = issue.values.iter().map(String::as_str).collect();
            if distinct.len() != issue.values.len() {
                return Err(ParleyError::InvalidDomain(format!(
                    "issue '{}' has duplicate values",
                    issue.id
                )));
            }
        }

        Ok(())
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Position of an issue by id
    pub fn issue_index(&self, id: &str) -> Option<usize> {
        self.issues.iter().position(|issue| issue.id == id)
    }

    /// Number of distinct bids, saturating at `u128::MAX`
    pub fn size(&self) -> u128 {
        self.issues
            .iter()
            .fold(1u128, |acc, issue| acc.saturating_mul(issue.values.len() as u128))
    }

    /// Build a bid from value positions, checking arity and ranges
    pub fn bid(&self, values: Vec<usize>) -> Result<Bid> {
        if values.len() != self.issues.len() {
            return Err(ParleyError::InvalidBid(format!(
                "expected {} values, got {}",
                self.issues.len(),
                values.len()
            )));
        }
        for (issue, &value) in self.issues.iter().zip(&values) {
            if value >= issue.values.len() {
                return Err(ParleyError::InvalidBid(format!(
                    "value {} out of range for issue '{}'",
                    value, issue.id
                )));
            }
        }
        Ok(Bid(values))
    }

    /// Build a bid from value labels given in issue order
    pub fn bid_from_labels(&self, labels: &[&str]) -> Result<Bid> {
        if labels.len() != self.issues.len() {
            return Err(ParleyError::InvalidBid(format!(
                "expected {} labels, got {}",
                self.issues.len(),
                labels.len()
            )));
        }
        let values = self
            .issues
            .iter()
            .zip(labels)
            .map(|(issue, label)| {
                issue.value_index(label).ok_or_else(|| {
                    ParleyError::InvalidBid(format!(
                        "unknown value '{}' for issue '{}'",
                        label, issue.id
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Bid(values))
    }

    /// Check that a bid received from outside belongs to this domain
    pub fn check(&self, bid: &Bid) -> Result<()> {
        self.bid(bid.0.clone()).map(|_| ())
    }

    /// The `index`-th bid in mixed-radix order (last issue varies fastest)
    pub fn nth_bid(&self, mut index: u128) -> Bid {
        let mut values = vec![0; self.issues.len()];
        for (slot, issue) in values.iter_mut().zip(&self.issues).rev() {
            let radix = issue.values.len() as u128;
            *slot = (index % radix) as usize;
            index /= radix;
        }
        Bid(values)
    }

    /// Uniformly random bid
    pub fn random_bid<R: Rng + ?Sized>(&self, rng: &mut R) -> Bid {
        Bid(self
            .issues
            .iter()
            .map(|issue| rng.gen_range(0..issue.values.len()))
            .collect())
    }

    /// Human-readable `issue=value` pairs
    pub fn describe(&self, bid: &Bid) -> String {
        self.issues
            .iter()
            .zip(bid.values())
            .map(|(issue, &v)| {
                let label = issue.values.get(v).map(String::as_str).unwrap_or("?");
                format!("{}={}", issue.id, label)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Complete assignment of one value per issue, by value position
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bid(Vec<usize>);

impl Bid {
    pub fn values(&self) -> &[usize] {
        &self.0
    }

    /// Value position chosen for an issue
    pub fn value(&self, issue: usize) -> usize {
        self.0[issue]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "[{}]", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_domain() -> Domain {
        Domain::new(
            "holiday",
            vec![
                Issue::new("location", &["beach", "city", "mountains"]),
                Issue::new("duration", &["week", "fortnight"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_domain_from_json() {
        let json = r#"{ "issues": [
            { "id": "price", "values": ["low", "mid", "high"] },
            { "id": "delivery", "values": ["now", "later"] }
        ] }"#;
        let domain = Domain::from_json(json).unwrap();
        assert_eq!(domain.issue_count(), 2);
        assert_eq!(domain.size(), 6);
        assert_eq!(domain.issue_index("delivery"), Some(1));
    }

    #[test]
    fn test_invalid_domains() {
        assert!(matches!(
            Domain::new("empty", vec![]),
            Err(ParleyError::InvalidDomain(_))
        ));
        assert!(matches!(
            Domain::new("no_values", vec![Issue::new("a", &[])]),
            Err(ParleyError::InvalidDomain(_))
        ));
        assert!(matches!(
            Domain::new("dup", vec![Issue::new("a", &["x"]), Issue::new("a", &["y"])]),
            Err(ParleyError::InvalidDomain(_))
        ));
        assert!(matches!(
            Domain::new("dup_values", vec![Issue::new("a", &["x", "x"])]),
            Err(ParleyError::InvalidDomain(_))
        ));
        assert!(Domain::from_json(r#"{ "issues": [] }"#).is_err());
    }

    #[test]
    fn test_size_saturates() {
        let domain = Domain::synthetic(200, 10).unwrap();
        assert_eq!(domain.size(), u128::MAX);
    }

    #[test]
    fn test_bid_validation() {
        let domain = sample_domain();
        assert!(domain.bid(vec![2, 1]).is_ok());
        assert!(matches!(domain.bid(vec![3, 0]), Err(ParleyError::InvalidBid(_))));
        assert!(matches!(domain.bid(vec![0]), Err(ParleyError::InvalidBid(_))));

        let bid = domain.bid_from_labels(&["city", "week"]).unwrap();
        assert_eq!(bid.values(), &[1, 0]);
        assert!(domain.bid_from_labels(&["moon", "week"]).is_err());
        assert_eq!(domain.describe(&bid), "location=city, duration=week");
    }

    #[test]
    fn test_nth_bid_enumerates_everything_once() {
        let domain = sample_domain();
        let all: HashSet<Bid> = (0..domain.size()).map(|i| domain.nth_bid(i)).collect();
        assert_eq!(all.len(), 6);
        assert_eq!(domain.nth_bid(0).values(), &[0, 0]);
        assert_eq!(domain.nth_bid(1).values(), &[0, 1]);
        assert_eq!(domain.nth_bid(5).values(), &[2, 1]);
    }

    #[test]
    fn test_random_bid_in_range() {
        let domain = sample_domain();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let bid = domain.random_bid(&mut rng);
            assert!(domain.check(&bid).is_ok());
        }
    }

    #[test]
    fn test_bid_structural_equality() {
        let domain = sample_domain();
        let a = domain.bid(vec![1, 1]).unwrap();
        let b = domain.bid_from_labels(&["city", "fortnight"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "[1,1]");
    }
}
