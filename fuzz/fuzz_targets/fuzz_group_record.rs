//! Fuzz target: persisted group record decoding
//!
//! Stores arbitrary bytes where the group record lives and checks that
//! loading either yields a map or a typed error, and that the store can
//! always be rewritten afterwards.
//!
//! cargo fuzz run fuzz_group_record

#![no_main]

use libfuzzer_sys::fuzz_target;
use ledmanager::adapters::group_store::PersistedGroups;
use ledmanager::adapters::storage::MemoryStorage;
use ledmanager::app::ports::{GroupStorePort, StoragePort};

fuzz_target!(|data: &[u8]| {
    let mut storage = MemoryStorage::new();
    if storage.write("ledmanager", "groups", data).is_err() {
        return;
    }

    let mut store = PersistedGroups::new(storage);
    let _ = store.load_all();

    store.store_group("chassis_identify", true).unwrap();
    assert_eq!(store.load_all().unwrap().get("chassis_identify"), Some(true));
});
