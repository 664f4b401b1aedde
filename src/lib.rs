//! Parley negotiation agent library
//!
//! Automated bilateral negotiation over multi-issue domains:
//! - Opponent preference modelling from observed offers
//! - Utility-indexed bid space with bounded search
//! - Time-dependent concession and combinable acceptance conditions
//! - An in-process alternating offers driver for self-play

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod negotiation;
pub mod opponent;
pub mod persist;
pub mod protocol;
pub mod strategy;
pub mod types;

// Re-export commonly used types
pub use config::AgentConfig;
pub use domain::{Bid, Domain, LinearAdditiveUtility, UtilityFunction};
pub use error::{ParleyError, Result};
pub use negotiation::{Action, Message, NegotiationAgent, SessionOutcome};
pub use protocol::{NegotiationOutcome, SaopConfig, SaopRunner};
pub use types::{OpponentId, Party, SessionId};
