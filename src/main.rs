//! Parley CLI binary

use anyhow::Context;
use clap::Parser;
use parley::cli::{summarize, Cli, Commands, ParleyApp};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => {
            tracing::info!(rounds = args.rounds, seed = ?args.seed, "starting self-play");

            let app = ParleyApp::new(args.stats_dir.clone());
            let outcome = app
                .simulate(&args)
                .await
                .context("simulation failed")?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", summarize(&outcome));
            }
        }

        Commands::Inspect {
            domain,
            enumeration_cap,
        } => {
            let report = ParleyApp::new(None)
                .inspect(&domain, enumeration_cap)
                .with_context(|| format!("cannot inspect {}", domain.display()))?;
            println!("{}", report);
        }
    }

    Ok(())
}
