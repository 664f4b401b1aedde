//! One JSON file per opponent under a directory

use crate::types::OpponentId;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::StatsStore;

/// Stats store backed by `<dir>/<storage key>.json`
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the opponent's blob
    pub fn path_for(&self, opponent: &OpponentId) -> PathBuf {
        self.dir.join(format!("{}.json", opponent.storage_key()))
    }

    fn write(&self, opponent: &OpponentId, blob: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(opponent);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)
    }
}

impl StatsStore for JsonFileStore {
    fn load(&self, opponent: &OpponentId) -> Option<Vec<u8>> {
        let path = self.path_for(opponent);
        match fs::read(&path) {
            Ok(blob) => {
                debug!(opponent = %opponent, path = %path.display(), "loaded opponent stats");
                Some(blob)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(opponent = %opponent, error = %e, "failed to read opponent stats");
                None
            }
        }
    }

    fn save(&self, opponent: &OpponentId, blob: &[u8]) -> bool {
        match self.write(opponent, blob) {
            Ok(()) => true,
            Err(e) => {
                warn!(opponent = %opponent, error = %e, "failed to save opponent stats");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("stats"));
        let opponent = OpponentId::new("bob");

        assert!(store.load(&opponent).is_none());
        assert!(store.save(&opponent, br#"{"sessions":1}"#));
        assert_eq!(store.load(&opponent), Some(br#"{"sessions":1}"#.to_vec()));

        let path = store.path_for(&opponent);
        assert!(path.exists());
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(format!("{}.json", opponent.storage_key()).as_str())
        );
    }

    #[test]
    fn test_unwritable_directory_returns_false() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a directory").expect("write");

        let store = JsonFileStore::new(&blocker);
        let opponent = OpponentId::new("bob");
        assert!(!store.save(&opponent, b"{}"));
        assert!(store.load(&opponent).is_none());
    }
}
