//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Parley - automated bilateral multi-issue negotiation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a self-play negotiation between two agents
    Simulate(SimulateArgs),

    /// Validate a domain file and report how it would be indexed
    Inspect {
        /// Domain description (JSON)
        domain: PathBuf,

        /// Largest bid space to enumerate instead of sampling
        #[arg(long, default_value = "50000")]
        enumeration_cap: u64,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Domain description (JSON); a synthetic domain is generated if omitted
    #[arg(short, long)]
    pub domain: Option<PathBuf>,

    /// Issues in the synthetic domain
    #[arg(long, default_value = "5")]
    pub issues: usize,

    /// Values per issue in the synthetic domain
    #[arg(long, default_value = "4")]
    pub values: usize,

    /// Utility profile of the first agent (random if omitted)
    #[arg(long)]
    pub profile_a: Option<PathBuf>,

    /// Utility profile of the second agent (random if omitted)
    #[arg(long)]
    pub profile_b: Option<PathBuf>,

    /// Agent configuration of the first agent (JSON)
    #[arg(long)]
    pub config_a: Option<PathBuf>,

    /// Agent configuration of the second agent (JSON)
    #[arg(long)]
    pub config_b: Option<PathBuf>,

    /// Name of the first agent
    #[arg(long, default_value = "alice")]
    pub name_a: String,

    /// Name of the second agent
    #[arg(long, default_value = "bob")]
    pub name_b: String,

    /// Reservation value of randomly generated profiles
    #[arg(short, long, default_value = "0.3")]
    pub reservation: f64,

    /// Total turns before the deadline
    #[arg(long, default_value = "200")]
    pub rounds: u32,

    /// Per-turn timeout in milliseconds
    #[arg(long, default_value = "1000")]
    pub turn_timeout_ms: u64,

    /// RNG seed for reproducible runs
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Directory for per-opponent statistics (kept in memory if omitted)
    #[arg(long)]
    pub stats_dir: Option<PathBuf>,

    /// Print the full outcome as JSON
    #[arg(long)]
    pub json: bool,
}
