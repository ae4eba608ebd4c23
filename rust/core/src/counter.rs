// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Process-wide diagnostic counters for exported features and geometries.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::class::{FeatureClass, GeometryClass};

/// Lock-free per-class counters shared by all export jobs.
#[derive(Debug, Default)]
pub struct Counters {
    geometries: [AtomicU64; GeometryClass::ALL.len()],
    features: [AtomicU64; FeatureClass::ALL.len()],
}

/// Point-in-time copy of [`Counters`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub geometries: Vec<(GeometryClass, u64)>,
    pub features: Vec<(FeatureClass, u64)>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_geometry(&self, class: GeometryClass) {
        self.geometries[class.index()].fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_feature(&self, class: FeatureClass) {
        self.features[class.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Adds `count` features of one class at once.
    #[inline]
    pub fn add_features(&self, class: FeatureClass, count: u64) {
        self.features[class.index()].fetch_add(count, Ordering::Relaxed);
    }

    pub fn geometry_count(&self, class: GeometryClass) -> u64 {
        self.geometries[class.index()].load(Ordering::Relaxed)
    }

    pub fn feature_count(&self, class: FeatureClass) -> u64 {
        self.features[class.index()].load(Ordering::Relaxed)
    }

    /// Returns the non-zero counters in declaration order.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            geometries: GeometryClass::ALL
                .iter()
                .map(|&c| (c, self.geometry_count(c)))
                .filter(|(_, n)| *n > 0)
                .collect(),
            features: FeatureClass::ALL
                .iter()
                .map(|&c| (c, self.feature_count(c)))
                .filter(|(_, n)| *n > 0)
                .collect(),
        }
    }
}

impl CounterSnapshot {
    pub fn geometry(&self, class: GeometryClass) -> u64 {
        self.geometries
            .iter()
            .find(|(c, _)| *c == class)
            .map_or(0, |(_, n)| *n)
    }

    pub fn feature(&self, class: FeatureClass) -> u64 {
        self.features
            .iter()
            .find(|(c, _)| *c == class)
            .map_or(0, |(_, n)| *n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn snapshot_skips_zero_counts() {
        let counters = Counters::new();
        counters.increment_geometry(GeometryClass::Polygon);
        counters.increment_geometry(GeometryClass::Polygon);
        counters.increment_feature(FeatureClass::Building);

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.geometries, vec![(GeometryClass::Polygon, 2)]);
        assert_eq!(snapshot.feature(FeatureClass::Building), 1);
        assert_eq!(snapshot.feature(FeatureClass::Room), 0);
    }

    #[test]
    fn batch_adds_accumulate_with_increments() {
        let counters = Counters::new();
        counters.add_features(FeatureClass::Appearance, 3);
        counters.add_features(FeatureClass::Appearance, 0);
        counters.increment_feature(FeatureClass::Appearance);
        assert_eq!(counters.feature_count(FeatureClass::Appearance), 4);
        assert!(counters.snapshot().features.iter().all(|(c, _)| *c == FeatureClass::Appearance));
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let counters = Arc::new(Counters::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counters = Arc::clone(&counters);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counters.increment_geometry(GeometryClass::Solid);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counters.geometry_count(GeometryClass::Solid), 8000);
    }
}
