// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared gml:id registry.
//!
//! Export jobs running on different worker threads use [`GmlIdLookup`] to
//! agree on which job owns a shared geometry or feature: the first
//! [`GmlIdLookup::lookup_and_put`] call for an identifier claims it, every
//! later call observes it as already present and emits a reference instead.
//!
//! The registry is lock-striped: an identifier's shard is picked by its
//! `FxHash`, so claims on different identifiers rarely contend.

use std::hash::{Hash, Hasher};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};

const SHARD_COUNT: usize = 16;

/// Kind of object an identifier was registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GmlIdKind {
    Geometry,
    Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Registration {
    row_id: i64,
    kind: GmlIdKind,
}

/// Concurrent gml:id registry with first-claim semantics.
#[derive(Debug)]
pub struct GmlIdLookup {
    by_gml_id: Vec<RwLock<FxHashMap<String, Registration>>>,
    by_row: Vec<RwLock<FxHashMap<(i64, GmlIdKind), String>>>,
}

impl Default for GmlIdLookup {
    fn default() -> Self {
        Self::new()
    }
}

// Shards only ever see single map inserts, so a poisoned shard is still consistent.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn shard_of<K: Hash + ?Sized>(key: &K) -> usize {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    (hasher.finish() as usize) % SHARD_COUNT
}

impl GmlIdLookup {
    pub fn new() -> Self {
        Self {
            by_gml_id: (0..SHARD_COUNT).map(|_| RwLock::default()).collect(),
            by_row: (0..SHARD_COUNT).map(|_| RwLock::default()).collect(),
        }
    }

    /// Registers `gml_id` unless it is already known.
    ///
    /// Returns `true` iff this call claimed the identifier first. The check
    /// and the insert happen under one shard write lock.
    pub fn lookup_and_put(&self, gml_id: &str, row_id: i64, kind: GmlIdKind) -> bool {
        let claimed = {
            let mut shard = write(&self.by_gml_id[shard_of(gml_id)]);
            if shard.contains_key(gml_id) {
                false
            } else {
                shard.insert(gml_id.to_string(), Registration { row_id, kind });
                true
            }
        };
        if claimed {
            self.put_row(gml_id, row_id, kind);
        }
        claimed
    }

    /// Registers `gml_id` unconditionally; the last registration wins.
    pub fn put(&self, gml_id: &str, row_id: i64, kind: GmlIdKind) {
        write(&self.by_gml_id[shard_of(gml_id)])
            .insert(gml_id.to_string(), Registration { row_id, kind });
        self.put_row(gml_id, row_id, kind);
    }

    /// Returns the identifier registered for a row.
    pub fn get(&self, row_id: i64, kind: GmlIdKind) -> Option<String> {
        let key = (row_id, kind);
        read(&self.by_row[shard_of(&key)]).get(&key).cloned()
    }

    /// Returns `true` if the identifier has been registered.
    pub fn contains(&self, gml_id: &str) -> bool {
        read(&self.by_gml_id[shard_of(gml_id)]).contains_key(gml_id)
    }

    /// Total number of registered identifiers.
    pub fn len(&self) -> usize {
        self.by_gml_id.iter().map(|shard| read(shard).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn put_row(&self, gml_id: &str, row_id: i64, kind: GmlIdKind) {
        let key = (row_id, kind);
        write(&self.by_row[shard_of(&key)]).insert(key, gml_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn first_claim_wins() {
        let lookup = GmlIdLookup::new();
        assert!(lookup.lookup_and_put("geom_1", 10, GmlIdKind::Geometry));
        assert!(!lookup.lookup_and_put("geom_1", 11, GmlIdKind::Geometry));
        assert_eq!(lookup.get(10, GmlIdKind::Geometry).as_deref(), Some("geom_1"));
        assert_eq!(lookup.get(11, GmlIdKind::Geometry), None);
    }

    #[test]
    fn rows_are_keyed_by_kind() {
        let lookup = GmlIdLookup::new();
        lookup.put("bldg_1", 5, GmlIdKind::Feature);
        assert_eq!(lookup.get(5, GmlIdKind::Geometry), None);
        assert_eq!(lookup.get(5, GmlIdKind::Feature).as_deref(), Some("bldg_1"));
        assert!(lookup.contains("bldg_1"));
        assert_eq!(lookup.len(), 1);
    }

    #[test]
    fn exactly_one_concurrent_claim_succeeds() {
        let lookup = Arc::new(GmlIdLookup::new());
        let winners = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let lookup = Arc::clone(&lookup);
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    if lookup.lookup_and_put("shared", i, GmlIdKind::Geometry) {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }
}
