// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-job export context.

use citydb_core::{Counters, ExportConfig, FeatureClass, GmlIdKind, GmlIdLookup, RowSource};
use citydb_geometry::{GeometryClass, SurfaceGeometryExporter, SurfaceGeometryResult};

use crate::appearance::AppearanceExporter;
use crate::citygml::{Appearance, LodGeometry, LodKind};
use crate::error::Result;

/// Everything one export job reads from: its own connection plus the
/// services shared by all jobs of a run.
pub struct ExportContext<'a> {
    pub source: &'a dyn RowSource,
    pub config: &'a ExportConfig,
    pub lookup: &'a GmlIdLookup,
    pub counters: &'a Counters,
    geometry: SurfaceGeometryExporter<'a>,
}

impl<'a> ExportContext<'a> {
    pub fn new(
        source: &'a dyn RowSource,
        config: &'a ExportConfig,
        lookup: &'a GmlIdLookup,
        counters: &'a Counters,
    ) -> Self {
        Self {
            source,
            config,
            lookup,
            counters,
            geometry: SurfaceGeometryExporter::new(source, config, lookup, counters),
        }
    }

    /// SRS name stamped on envelopes.
    pub fn srs_name(&self) -> Option<String> {
        self.config.target_srs.as_ref().map(|srs| srs.srs_name.clone())
    }

    pub fn geometry(&self, root_id: i64) -> Result<Option<SurfaceGeometryResult>> {
        Ok(self.geometry.read(root_id)?)
    }

    /// Reads the geometry of one LOD slot.
    ///
    /// Solid slots take solids and composite solids, multi-surface slots take
    /// multi-surfaces; anything else is logged and left out.
    pub fn lod_geometry(&self, lod: u8, kind: LodKind, root_id: Option<i64>) -> Result<Option<LodGeometry>> {
        let Some(root_id) = root_id else {
            return Ok(None);
        };
        let Some(geometry) = self.geometry(root_id)? else {
            return Ok(None);
        };

        let class = geometry.class();
        let accepted = match kind {
            LodKind::Solid => class.is_solid_member(),
            LodKind::MultiSurface => class == GeometryClass::MultiSurface,
        };
        if !accepted {
            tracing::error!(root_id, lod, slot = ?kind, %class, "geometry does not fit its LOD slot");
            return Ok(None);
        }
        Ok(Some(LodGeometry { lod, kind, geometry }))
    }

    /// Reads `(lod, kind, root id)` slots in order, skipping empty ones.
    pub fn lod_geometries(
        &self,
        slots: impl IntoIterator<Item = (u8, LodKind, Option<i64>)>,
    ) -> Result<Vec<LodGeometry>> {
        let mut geometries = Vec::new();
        for (lod, kind, root_id) in slots {
            if let Some(geometry) = self.lod_geometry(lod, kind, root_id)? {
                geometries.push(geometry);
            }
        }
        Ok(geometries)
    }

    /// Appearances of a city object; empty unless appearance export is on.
    pub fn appearances(&self, cityobject_id: i64) -> Result<Vec<Appearance>> {
        if !self.config.export_appearance {
            return Ok(Vec::new());
        }
        AppearanceExporter::new(self).read(cityobject_id)
    }

    /// Records an exported feature.
    ///
    /// Nested classes are counted here; top-level features are counted when
    /// they are printed. The gml:id is registered for group member lookups
    /// when group export is enabled.
    pub fn feature_exported(&self, class: FeatureClass, gml_id: Option<&str>, row_id: i64) {
        if !class.is_top_level() {
            self.counters.increment_feature(class);
        }
        if let (true, Some(gml_id)) = (self.config.registers_feature_ids(), gml_id) {
            self.lookup.put(gml_id, row_id, GmlIdKind::Feature);
        }
    }
}
