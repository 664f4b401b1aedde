//! Core identifiers used throughout Parley

use blake2::{Blake2b512, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for a negotiation session (timestamp-based)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new session ID with timestamp and a random suffix
    pub fn generate() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        Self(format!("session_{}_{:08x}", timestamp, rand::random::<u32>()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the agent on the other side of the table
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpponentId(pub String);

impl OpponentId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Stable, filesystem-safe key derived from the opponent name
    pub fn storage_key(&self) -> String {
        let mut hasher = Blake2b512::new();
        hasher.update(self.0.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16]) // Use first 16 bytes
    }
}

impl fmt::Display for OpponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the table produced a bid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    Own,
    Opponent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_creation() {
        let id1 = SessionId::generate();
        let id2 = SessionId::generate();

        assert!(id1.0.starts_with("session_"));
        // Random suffix keeps IDs apart even within one millisecond
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_storage_key_deterministic() {
        let a = OpponentId::new("boulware_bot");
        let b = OpponentId::new("conceder_bot");

        assert_ne!(a.storage_key(), b.storage_key());
        assert_eq!(a.storage_key(), OpponentId::new("boulware_bot").storage_key());
        assert_eq!(a.storage_key().len(), 32);
        assert!(a.storage_key().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_serialization() {
        let id = OpponentId::new("opponent/with:odd chars");
        let serialized = serde_json::to_string(&id).unwrap();
        let deserialized: OpponentId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(id, deserialized);
    }
}
