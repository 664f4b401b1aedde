//! Error types for Parley

use thiserror::Error;

/// Main error type for Parley
#[derive(Error, Debug)]
pub enum ParleyError {
    // Domain errors
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Invalid bid: {0}")]
    InvalidBid(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    // Strategy errors
    #[error("Negotiation impossible: best indexed utility {best:.4} is below reservation {reservation:.4}")]
    NegotiationImpossible { reservation: f64, best: f64 },

    // Session errors
    #[error("Invalid negotiation state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Party disconnected: {0}")]
    PartyDisconnected(String),

    // Configuration errors
    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Whether the error ends the current session.
    ///
    /// Everything else is absorbed by the component that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ParleyError::InvalidDomain(_) | ParleyError::NegotiationImpossible { .. }
        )
    }
}

/// Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, ParleyError>;
