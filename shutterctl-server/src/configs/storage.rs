use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use time::format_description::BorrowedFormatItem;
use time::{OffsetDateTime, UtcOffset};
use time::macros::format_description;

use crate::errors::StorageError;

/// Key of the snapshot entry recording when it was written.
pub const TIME_KEY: &str = "time";

const SNAPSHOT_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[day].[month].[year] [hour]:[minute]:[second]");

/// Last-known entity values keyed by entity id.
///
/// The in-memory map is authoritative; the file only exists to survive
/// restarts, so readers and the flush task share the map behind a lock and
/// the flush works on a copy.
#[derive(Clone)]
pub struct StateStore {
    states: Arc<RwLock<BTreeMap<String, String>>>,
    path: Option<PathBuf>,
    offset: UtcOffset,
}

impl StateStore {
    pub fn in_memory() -> Self {
        Self {
            states: Arc::default(),
            path: None,
            offset: UtcOffset::UTC,
        }
    }

    /// Opens the snapshot at `path`; a missing or unreadable file yields an
    /// empty store.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let states = match Self::read(&path) {
            Ok(states) => {
                tracing::debug!("states loaded from {}: {} entries", path.display(), states.len());
                states
            }
            Err(e) => {
                tracing::warn!("{} not readable, starting empty: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self {
            states: Arc::new(RwLock::new(states)),
            path: Some(path),
            offset: UtcOffset::UTC,
        }
    }

    /// Stamps snapshots in `offset` instead of UTC.
    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    fn read(path: &Path) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    /// Shallow copy of the current map.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.states.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Writes the snapshot plus a `time` entry as pretty-printed JSON.
    ///
    /// In-memory stores have nowhere to write and succeed without effect.
    pub fn flush(&self) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut snapshot = self.snapshot();
        snapshot.insert(TIME_KEY.to_string(), self.timestamp(OffsetDateTime::now_utc())?);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;

        Ok(())
    }

    fn timestamp(&self, now: OffsetDateTime) -> Result<String, StorageError> {
        Ok(now.to_offset(self.offset).format(SNAPSHOT_TIME)?)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{datetime, offset};

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("shutterctl-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let store = StateStore::load(temp_path("missing"));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_flush_and_reload() {
        let path = temp_path("roundtrip");
        let store = StateStore::load(&path);
        store.set("shutters_rain_input", "storm");
        store.set("shutters_kitchen_manual_value", "");
        store.flush().unwrap();

        let reloaded = StateStore::load(&path);
        assert_eq!(reloaded.get("shutters_rain_input").as_deref(), Some("storm"));
        assert_eq!(reloaded.get("shutters_kitchen_manual_value").as_deref(), Some(""));
        assert!(reloaded.get(TIME_KEY).is_some());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_unreadable_file_starts_empty() {
        let path = temp_path("garbage");
        fs::write(&path, "not json").unwrap();

        let store = StateStore::load(&path);
        assert!(store.snapshot().is_empty());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_timestamp_uses_local_offset() {
        let now = datetime!(2026-10-16 03:07:33 UTC);

        assert_eq!(StateStore::in_memory().timestamp(now).unwrap(), "16.10.2026 03:07:33");

        let store = StateStore::in_memory().with_offset(offset!(+2));
        assert_eq!(store.timestamp(now).unwrap(), "16.10.2026 05:07:33");
    }

    #[test]
    fn test_clones_share_state() {
        let store = StateStore::in_memory();
        let other = store.clone();
        other.set("a", "1");

        assert_eq!(store.get("a").as_deref(), Some("1"));
        assert!(store.flush().is_ok());
    }
}
