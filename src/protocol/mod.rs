//! In-process protocol driver for two agents

pub mod party;
pub mod runner;

pub use party::PartyHandle;
pub use runner::{NegotiationOutcome, SaopConfig, SaopRunner, TurnEvent};
