//! Self-play demo: a boulware agent against a conceder, three sessions in a row
//!
//! Both agents share one stats store, so the second and third sessions start
//! from what the earlier ones taught each side about the other.
//!
//! Run with: cargo run --example self_play

use parley::cli::summarize;
use parley::negotiation::NegotiationAgent;
use parley::persist::{MemoryStore, OpponentStats, StatsStore};
use parley::protocol::{SaopConfig, SaopRunner};
use parley::strategy::ConcessionConfig;
use parley::{AgentConfig, Domain, LinearAdditiveUtility, OpponentId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("warn,parley=info")
        .init();

    println!("\n╔══════════════════════════════════════════════╗");
    println!("║   Parley Self-Play Demo                      ║");
    println!("║   Boulware vs Conceder                       ║");
    println!("╚══════════════════════════════════════════════╝\n");

    let mut rng = StdRng::seed_from_u64(2024);
    let domain = Domain::synthetic(6, 5)?;
    println!("Domain: {} issues, {} possible bids\n", domain.issue_count(), domain.size());

    let buyer = Arc::new(LinearAdditiveUtility::random(domain.clone(), 0.3, &mut rng)?);
    let seller = Arc::new(LinearAdditiveUtility::random(domain.clone(), 0.3, &mut rng)?);

    let boulware = AgentConfig {
        concession: ConcessionConfig {
            exponent: 0.2,
            min_utility: 0.5,
        },
        ..AgentConfig::default()
    };
    let conceder = AgentConfig {
        concession: ConcessionConfig {
            exponent: 2.0,
            min_utility: 0.4,
        },
        ..AgentConfig::default()
    };

    let store = Arc::new(MemoryStore::new());
    for session in 1..=3u64 {
        println!("── Session {} ──────────────────────────────────", session);
        let runner = SaopRunner::new(SaopConfig {
            rounds: 120,
            turn_timeout: Duration::from_millis(500),
        });
        let buyer_agent = NegotiationAgent::new(
            "buyer",
            buyer.clone(),
            &boulware.clone().with_seed(Some(session)),
            Box::new(runner.clock()),
            store.clone(),
        )?;
        let seller_agent = NegotiationAgent::new(
            "seller",
            seller.clone(),
            &conceder.clone().with_seed(Some(session + 100)),
            Box::new(runner.clock()),
            store.clone(),
        )?;

        let outcome = runner.run(buyer_agent, seller_agent).await?;
        println!("{}\n", summarize(&outcome));
    }

    if let Some(blob) = store.load(&OpponentId::new("seller")) {
        let stats: OpponentStats = serde_json::from_slice(&blob)?;
        println!(
            "Buyer's view of the seller: {} sessions, {} agreements, mean utility {:.3}",
            stats.sessions, stats.agreements, stats.mean_agreement_utility
        );
    }

    Ok(())
}
