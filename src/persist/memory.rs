//! In-process stats store

use crate::types::OpponentId;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::warn;

use super::StatsStore;

/// Keeps blobs in a map; shared between agents of one process
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<OpponentId, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StatsStore for MemoryStore {
    fn load(&self, opponent: &OpponentId) -> Option<Vec<u8>> {
        match self.blobs.read() {
            Ok(blobs) => blobs.get(opponent).cloned(),
            Err(_) => {
                warn!(opponent = %opponent, "stats store lock poisoned");
                None
            }
        }
    }

    fn save(&self, opponent: &OpponentId, blob: &[u8]) -> bool {
        match self.blobs.write() {
            Ok(mut blobs) => {
                blobs.insert(opponent.clone(), blob.to_vec());
                true
            }
            Err(_) => {
                warn!(opponent = %opponent, "stats store lock poisoned");
                false
            }
        }
    }
}
