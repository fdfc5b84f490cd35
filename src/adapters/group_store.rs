//! Durable group intent.
//!
//! [`PersistedGroups`] implements [`GroupStorePort`] on top of any
//! [`StoragePort`].  The whole [`GroupIntent`] is one record,
//! postcard-encoded and rewritten on every change, so a reload always
//! sees a consistent snapshot.
//!
//! The record lists *intent*, not what the LEDs were showing; startup
//! replays it through arbitration in assertion order.
//!
//! | Version | Body                                   |
//! |---------|----------------------------------------|
//! | 1       | name → asserted map, sorted by name    |
//! | 2       | `(name, asserted)` list, by last change |
//!
//! Version 1 records are still read; their order is the name order.

use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{GroupIntent, GroupStorePort, StorageError, StoragePort};

const NAMESPACE: &str = "ledmanager";
const KEY: &str = "groups";
const RECORD_VERSION: u8 = 2;
const LEGACY_VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    version: u8,
    groups: GroupIntent,
}

#[derive(Debug, Deserialize)]
struct LegacyRecord {
    version: u8,
    groups: BTreeMap<String, bool>,
}

pub struct PersistedGroups<S> {
    storage: S,
    /// Mirror of the last successfully written record.
    cache: GroupIntent,
}

impl<S: StoragePort> PersistedGroups<S> {
    /// Wrap `storage`, priming the cache from any existing record.
    ///
    /// An unreadable record is logged and treated as empty; the next
    /// write replaces it.
    pub fn new(storage: S) -> Self {
        let cache = match read_record(&storage) {
            Ok(groups) => groups,
            Err(StorageError::NotFound) => GroupIntent::new(),
            Err(e) => {
                warn!("PersistedGroups: discarding unreadable record: {}", e);
                GroupIntent::new()
            }
        };
        info!("PersistedGroups: {} recorded group(s)", cache.len());
        Self { storage, cache }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

fn read_record(storage: &impl StoragePort) -> Result<GroupIntent, StorageError> {
    let bytes = storage.read(NAMESPACE, KEY)?;
    match bytes.first() {
        Some(&RECORD_VERSION) => {
            let record: Record = postcard::from_bytes(&bytes).map_err(|_| StorageError::Corrupted)?;
            Ok(record.groups)
        }
        Some(&LEGACY_VERSION) => {
            let record: LegacyRecord = postcard::from_bytes(&bytes).map_err(|_| StorageError::Corrupted)?;
            info!("PersistedGroups: upgrading v{} record", record.version);
            Ok(record.groups.into_iter().collect())
        }
        _ => Err(StorageError::Corrupted),
    }
}

impl<S: StoragePort> GroupStorePort for PersistedGroups<S> {
    fn store_group(&mut self, name: &str, asserted: bool) -> Result<(), StorageError> {
        let mut groups = self.cache.clone();
        groups.record(name, asserted);

        let record = Record {
            version: RECORD_VERSION,
            groups,
        };
        let bytes = postcard::to_allocvec(&record).map_err(|e| StorageError::IoError(e.to_string()))?;
        self.storage.write(NAMESPACE, KEY, &bytes)?;
        self.cache = record.groups;
        Ok(())
    }

    fn load_all(&self) -> Result<GroupIntent, StorageError> {
        match read_record(&self.storage) {
            Err(StorageError::NotFound) => Ok(GroupIntent::new()),
            other => other,
        }
    }
}
