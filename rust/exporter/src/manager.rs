// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Export manager shared by all jobs of a run.

use std::sync::{Arc, Mutex, PoisonError};

use citydb_core::{
    CounterSnapshot, Counters, ExportConfig, FeatureClass, GmlIdLookup, RootObject, RowSource,
};

use crate::building::BuildingExporter;
use crate::citygml::CityObject;
use crate::context::ExportContext;
use crate::error::{Error, Result};
use crate::group::CityObjectGroupExporter;
use crate::writer::FeatureWriter;

/// Routes top-level objects to their exporter and serialises the results.
///
/// The configuration, gml:id lookup and counters are shared with every job;
/// the writer is behind a mutex so features are written whole, one at a time.
pub struct ExportManager<W: FeatureWriter> {
    config: Arc<ExportConfig>,
    lookup: Arc<GmlIdLookup>,
    counters: Arc<Counters>,
    writer: Mutex<W>,
}

impl<W: FeatureWriter> ExportManager<W> {
    pub fn new(config: ExportConfig, writer: W) -> Self {
        Self::with_services(
            Arc::new(config),
            Arc::new(GmlIdLookup::new()),
            Arc::new(Counters::new()),
            writer,
        )
    }

    /// Builds a manager around existing services, e.g. to share one lookup
    /// between consecutive runs.
    pub fn with_services(
        config: Arc<ExportConfig>,
        lookup: Arc<GmlIdLookup>,
        counters: Arc<Counters>,
        writer: W,
    ) -> Self {
        Self {
            config,
            lookup,
            counters,
            writer: Mutex::new(writer),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn lookup(&self) -> &Arc<GmlIdLookup> {
        &self.lookup
    }

    pub fn counters(&self) -> &Arc<Counters> {
        &self.counters
    }

    /// Context for one job reading through `source`.
    pub fn context<'a>(&'a self, source: &'a dyn RowSource) -> ExportContext<'a> {
        ExportContext::new(source, &self.config, &self.lookup, &self.counters)
    }

    /// Exports one top-level object and prints it.
    ///
    /// Returns `Ok(false)` when the object produced no feature.
    pub fn export_object(&self, source: &dyn RowSource, object: &RootObject) -> Result<bool> {
        let ctx = self.context(source);
        let feature = match object.class {
            FeatureClass::Building => BuildingExporter::new(&ctx)
                .read(object.id)?
                .map(CityObject::Building),
            FeatureClass::CityObjectGroup => CityObjectGroupExporter::new(&ctx)
                .read(object.id)?
                .map(CityObject::CityObjectGroup),
            class => return Err(Error::NotTopLevel { class, id: object.id }),
        };

        match feature {
            Some(feature) => {
                self.print(&feature)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Writes a finished top-level feature and counts it.
    pub fn print(&self, feature: &CityObject) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| citydb_core::Error::LockPoisoned("feature writer"))?;
        writer.write(feature)?;
        self.counters.increment_feature(feature.class());
        Ok(())
    }

    /// Flushes the writer.
    pub fn finish(&self) -> Result<()> {
        self.writer
            .lock()
            .map_err(|_| citydb_core::Error::LockPoisoned("feature writer"))?
            .finish()
    }

    /// Current counter values
    pub fn summary(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Consumes the manager and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citydb_core::{BuildingRow, MemorySource};

    #[test]
    fn printed_features_are_counted_by_class() {
        let mut source = MemorySource::new();
        source
            .add_building(BuildingRow::new(1, None, 1))
            .add_building(BuildingRow::new(2, Some(1), 1));

        let manager = ExportManager::new(ExportConfig::default(), Vec::<CityObject>::new());
        let object = RootObject {
            id: 1,
            class: FeatureClass::Building,
            gml_id: None,
        };
        assert!(manager.export_object(&source, &object).unwrap());

        let summary = manager.summary();
        assert_eq!(summary.feature(FeatureClass::Building), 1);
        assert_eq!(summary.feature(FeatureClass::BuildingPart), 1);
        assert_eq!(manager.into_writer().len(), 1);
    }

    #[test]
    fn nested_classes_are_not_top_level() {
        let source = MemorySource::new();
        let manager = ExportManager::new(ExportConfig::default(), Vec::<CityObject>::new());
        let object = RootObject {
            id: 3,
            class: FeatureClass::Room,
            gml_id: None,
        };
        let err = manager.export_object(&source, &object).unwrap_err();
        assert!(matches!(err, Error::NotTopLevel { class: FeatureClass::Room, id: 3 }));
    }

    #[test]
    fn missing_object_prints_nothing() {
        let source = MemorySource::new();
        let manager = ExportManager::new(ExportConfig::default(), Vec::<CityObject>::new());
        let object = RootObject {
            id: 8,
            class: FeatureClass::CityObjectGroup,
            gml_id: None,
        };
        assert!(!manager.export_object(&source, &object).unwrap());
        assert!(manager.into_writer().is_empty());
    }
}
