// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parallel dispatch of export jobs.
//!
//! The splitter enumerates the top-level objects selected by an
//! [`ExportFilter`] and runs one job per object on a rayon pool. Each job
//! opens its own connection. Failed jobs are logged and counted without
//! affecting the others.
//!
//! City object groups run in a second phase once every other feature has
//! been written, so member lookups see all exported features.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use citydb_core::{ConnectionProvider, CounterSnapshot, ExportFilter, FeatureClass, RootObject};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::manager::ExportManager;
use crate::writer::FeatureWriter;

/// Outcome of an export run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Jobs that printed a feature
    pub exported: usize,
    /// Jobs that found nothing to export
    pub skipped: usize,
    pub failed: usize,
    /// Jobs not started because the run was stopped
    pub cancelled: usize,
    pub counters: CounterSnapshot,
}

#[derive(Default)]
struct Tally {
    exported: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicUsize,
}

impl Tally {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn into_summary(self, counters: CounterSnapshot) -> ExportSummary {
        ExportSummary {
            exported: self.exported.into_inner(),
            skipped: self.skipped.into_inner(),
            failed: self.failed.into_inner(),
            cancelled: self.cancelled.into_inner(),
            counters,
        }
    }
}

pub struct Splitter<'m, W: FeatureWriter, P: ConnectionProvider + ?Sized> {
    manager: &'m ExportManager<W>,
    provider: &'m P,
    filter: ExportFilter,
    stop: Arc<AtomicBool>,
}

impl<'m, W: FeatureWriter, P: ConnectionProvider + ?Sized> Splitter<'m, W, P> {
    pub fn new(manager: &'m ExportManager<W>, provider: &'m P, filter: ExportFilter) -> Self {
        Self {
            manager,
            provider,
            filter,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Uses an externally owned stop flag.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Flag that stops the run when set; jobs already running complete.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn run(&self) -> Result<ExportSummary> {
        let start = Instant::now();
        let config = self.manager.config();

        let objects = {
            let connection = self.provider.connect()?;
            connection.root_objects(&self.filter)?
        };
        let (mut groups, features): (Vec<RootObject>, Vec<RootObject>) = objects
            .into_iter()
            .partition(|object| object.class == FeatureClass::CityObjectGroup);
        if !config.export_groups && !groups.is_empty() {
            tracing::debug!(count = groups.len(), "group export disabled; skipping city object groups");
            groups.clear();
        }

        tracing::info!(
            features = features.len(),
            groups = groups.len(),
            workers = config.worker_threads,
            "Starting export"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|i| format!("citydb-export-{i}"))
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;

        let tally = Tally::default();
        pool.install(|| {
            for phase in [&features, &groups] {
                phase.par_iter().for_each(|object| self.dispatch(object, &tally));
            }
        });
        self.manager.finish()?;

        let summary = tally.into_summary(self.manager.summary());
        tracing::info!(
            exported = summary.exported,
            skipped = summary.skipped,
            failed = summary.failed,
            cancelled = summary.cancelled,
            elapsed_ms = start.elapsed().as_millis(),
            "Export finished"
        );
        Ok(summary)
    }

    fn dispatch(&self, object: &RootObject, tally: &Tally) {
        if self.stop.load(Ordering::Relaxed) {
            Tally::bump(&tally.cancelled);
            return;
        }

        match self.export(object) {
            Ok(true) => Tally::bump(&tally.exported),
            Ok(false) => {
                tracing::debug!(id = object.id, class = %object.class, "nothing to export");
                Tally::bump(&tally.skipped);
            }
            Err(err) => {
                tracing::error!(id = object.id, class = %object.class, error = %err, "export job failed");
                Tally::bump(&tally.failed);
            }
        }
    }

    fn export(&self, object: &RootObject) -> Result<bool> {
        let connection = self.provider.connect()?;
        self.manager.export_object(connection.as_ref(), object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citygml::CityObject;
    use citydb_core::{BuildingRow, ExportConfig, MemorySource};

    /// Raises the stop flag once it has written `limit` features.
    struct StoppingWriter {
        stop: Arc<AtomicBool>,
        limit: usize,
        written: usize,
    }

    impl FeatureWriter for StoppingWriter {
        fn write(&mut self, _feature: &CityObject) -> Result<()> {
            self.written += 1;
            if self.written >= self.limit {
                self.stop.store(true, Ordering::Relaxed);
            }
            Ok(())
        }
    }

    fn buildings(count: i64) -> MemorySource {
        let mut source = MemorySource::new();
        for id in 1..=count {
            source.add_building(BuildingRow::new(id, None, id));
        }
        source
    }

    fn config(workers: usize) -> ExportConfig {
        ExportConfig {
            worker_threads: workers,
            ..ExportConfig::default()
        }
    }

    #[test]
    fn stop_flag_halts_dispatch_between_jobs() {
        let source = buildings(10);
        let stop = Arc::new(AtomicBool::new(false));
        let writer = StoppingWriter {
            stop: Arc::clone(&stop),
            limit: 3,
            written: 0,
        };
        let manager = ExportManager::new(config(1), writer);

        let summary = Splitter::new(&manager, &source, ExportFilter::default())
            .with_stop_flag(stop)
            .run()
            .unwrap();
        assert_eq!(summary.exported, 3);
        assert_eq!(summary.cancelled, 7);
    }

    #[test]
    fn stopped_before_start_exports_nothing() {
        let source = buildings(4);
        let manager = ExportManager::new(config(2), Vec::<CityObject>::new());
        let splitter = Splitter::new(&manager, &source, ExportFilter::default());
        splitter.stop_flag().store(true, Ordering::Relaxed);

        let summary = splitter.run().unwrap();
        assert_eq!(summary.cancelled, 4);
        assert_eq!(summary.exported, 0);
        assert!(manager.into_writer().is_empty());
    }
}
