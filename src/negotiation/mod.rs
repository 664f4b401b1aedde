//! Session state and the per-turn negotiation driver

pub mod agent;
pub mod history;
pub mod progress;
pub mod session;
pub mod types;

pub use agent::NegotiationAgent;
pub use history::{BidRecord, History};
pub use progress::{ProgressSignal, RoundClock, WallClock};
pub use session::SessionState;
pub use types::{Action, Message, SessionOutcome, SessionSettings};
