//! Parley application wiring the CLI to the library

use crate::config::AgentConfig;
use crate::domain::{Domain, LinearAdditiveUtility};
use crate::error::Result;
use crate::negotiation::NegotiationAgent;
use crate::persist::{JsonFileStore, MemoryStore, StatsStore};
use crate::protocol::{NegotiationOutcome, SaopConfig, SaopRunner};
use crate::strategy::{rng_from_seed, IndexConfig};
use rand::rngs::StdRng;
use rand::Rng;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::commands::SimulateArgs;

/// Summary of a domain file
#[derive(Clone, Debug, PartialEq)]
pub struct DomainReport {
    pub name: String,
    pub issues: usize,
    pub size: u128,
    pub exhaustive: bool,
    /// Bids in the index; an upper bound when sampled, since duplicate
    /// draws are dropped
    pub indexed: u128,
}

impl fmt::Display for DomainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Domain:    {}", self.name)?;
        writeln!(f, "Issues:    {}", self.issues)?;
        writeln!(f, "Bid space: {}", self.size)?;
        if self.exhaustive {
            write!(f, "Index:     enumerated ({} bids)", self.indexed)
        } else {
            write!(f, "Index:     sampled (at most {} bids)", self.indexed)
        }
    }
}

/// Main Parley application
#[derive(Clone)]
pub struct ParleyApp {
    store: Arc<dyn StatsStore>,
}

impl ParleyApp {
    /// Stats go to `stats_dir` when given, otherwise they live in memory
    pub fn new(stats_dir: Option<PathBuf>) -> Self {
        let store: Arc<dyn StatsStore> = match stats_dir {
            Some(dir) => Arc::new(JsonFileStore::new(dir)),
            None => Arc::new(MemoryStore::new()),
        };
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn StatsStore> {
        self.store.clone()
    }

    /// Run one self-play session
    pub async fn simulate(&self, args: &SimulateArgs) -> Result<NegotiationOutcome> {
        let mut rng = rng_from_seed(args.seed);
        let domain = match &args.domain {
            Some(path) => Domain::from_file(path)?,
            None => Domain::synthetic(args.issues, args.values)?,
        };
        tracing::info!(
            domain = %domain.name,
            issues = domain.issue_count(),
            size = %domain.size(),
            "loaded domain"
        );

        let runner = SaopRunner::new(SaopConfig {
            rounds: args.rounds,
            turn_timeout: Duration::from_millis(args.turn_timeout_ms),
        });

        let first = self.agent(
            &args.name_a,
            &domain,
            args.profile_a.as_deref(),
            args.config_a.as_deref(),
            args,
            &runner,
            &mut rng,
        )?;
        let second = self.agent(
            &args.name_b,
            &domain,
            args.profile_b.as_deref(),
            args.config_b.as_deref(),
            args,
            &runner,
            &mut rng,
        )?;
        runner.run(first, second).await
    }

    #[allow(clippy::too_many_arguments)]
    fn agent(
        &self,
        name: &str,
        domain: &Domain,
        profile: Option<&Path>,
        config: Option<&Path>,
        args: &SimulateArgs,
        runner: &SaopRunner,
        rng: &mut StdRng,
    ) -> Result<NegotiationAgent> {
        let utility = match profile {
            Some(path) => LinearAdditiveUtility::from_file(domain.clone(), path)?,
            None => LinearAdditiveUtility::random(domain.clone(), args.reservation, rng)?,
        };
        let mut config = match config {
            Some(path) => AgentConfig::from_file(path)?,
            None => AgentConfig::default(),
        };
        if config.seed.is_none() && args.seed.is_some() {
            config.seed = Some(rng.gen());
        }
        NegotiationAgent::new(
            name,
            Arc::new(utility),
            &config,
            Box::new(runner.clock()),
            self.store.clone(),
        )
    }

    /// Validate a domain file and describe its index
    pub fn inspect(&self, path: &Path, enumeration_cap: u64) -> Result<DomainReport> {
        let domain = Domain::from_file(path)?;
        let size = domain.size();
        let config = IndexConfig {
            enumeration_cap,
            ..IndexConfig::default()
        };
        let exhaustive = size <= u128::from(config.enumeration_cap);
        let indexed = if exhaustive {
            size
        } else {
            // sample plus the forced maximum bid, never more than the space
            (config.sample_size as u128 + 1).min(size)
        };
        Ok(DomainReport {
            name: domain.name.clone(),
            issues: domain.issue_count(),
            size,
            exhaustive,
            indexed,
        })
    }
}

/// Human-readable outcome summary
pub fn summarize(outcome: &NegotiationOutcome) -> String {
    let mut lines = vec![
        format!("Session:   {}", outcome.session),
        format!("Parties:   {} vs {}", outcome.parties[0], outcome.parties[1]),
        format!("Turns:     {}", outcome.turns),
    ];
    match (&outcome.agreement, outcome.utilities) {
        (Some(bid), Some([a, b])) => {
            lines.push(format!("Agreement: {}", bid));
            lines.push(format!(
                "Utilities: {} = {:.4}, {} = {:.4}",
                outcome.parties[0], a, outcome.parties[1], b
            ));
            lines.push(format!(
                "Welfare:   {:.4} (Nash product {:.4})",
                a + b,
                a * b
            ));
        }
        _ => lines.push("Agreement: none".to_string()),
    }
    if outcome.missed_turns() > 0 {
        lines.push(format!("Missed:    {} turns", outcome.missed_turns()));
    }
    if let Some(reason) = &outcome.aborted {
        lines.push(format!("Aborted:   {}", reason));
    }
    lines.join("\n")
}
