// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary surface and opening export.

use citydb_core::{FeatureClass, OpeningRow, SurfaceOwner, ThematicSurfaceRow};

use crate::citygml::{BoundarySurface, BoundarySurfaceKind, LodKind, Opening, OpeningKind};
use crate::context::ExportContext;
use crate::error::Result;

pub struct ThematicSurfaceExporter<'c, 'a> {
    ctx: &'c ExportContext<'a>,
}

impl<'c, 'a> ThematicSurfaceExporter<'c, 'a> {
    pub fn new(ctx: &'c ExportContext<'a>) -> Self {
        Self { ctx }
    }

    /// Reads the boundary surfaces of a building or room.
    ///
    /// Surfaces of an unknown type are logged and skipped.
    pub fn read(&self, owner: SurfaceOwner) -> Result<Vec<BoundarySurface>> {
        let rows = self.ctx.source.thematic_surfaces(owner)?;
        let mut surfaces = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(kind) = BoundarySurfaceKind::from_type_name(&row.surface_type) else {
                tracing::error!(
                    id = row.id,
                    surface_type = %row.surface_type,
                    ?owner,
                    "unsupported boundary surface type"
                );
                continue;
            };
            surfaces.push(self.surface(kind, row)?);
        }
        Ok(surfaces)
    }

    fn surface(&self, kind: BoundarySurfaceKind, row: ThematicSurfaceRow) -> Result<BoundarySurface> {
        let [lod2, lod3, lod4] = row.lod_multi_surface_ids;
        let geometry = self.ctx.lod_geometries([
            (2, LodKind::MultiSurface, lod2),
            (3, LodKind::MultiSurface, lod3),
            (4, LodKind::MultiSurface, lod4),
        ])?;

        let mut openings = Vec::new();
        for opening in self.ctx.source.openings(row.id)? {
            if let Some(opening) = self.opening(opening)? {
                openings.push(opening);
            }
        }

        let appearances = self.ctx.appearances(row.id)?;
        self.ctx
            .feature_exported(FeatureClass::BoundarySurface, row.gml_id.as_deref(), row.id);

        Ok(BoundarySurface {
            kind,
            gml_id: row.gml_id,
            name: row.name,
            description: row.description,
            geometry,
            openings,
            appearances,
        })
    }

    fn opening(&self, row: OpeningRow) -> Result<Option<Opening>> {
        let Some(kind) = OpeningKind::from_type_name(&row.opening_type) else {
            tracing::error!(id = row.id, opening_type = %row.opening_type, "unsupported opening type");
            return Ok(None);
        };

        let [lod3, lod4] = row.lod_multi_surface_ids;
        let geometry = self.ctx.lod_geometries([
            (3, LodKind::MultiSurface, lod3),
            (4, LodKind::MultiSurface, lod4),
        ])?;
        self.ctx
            .feature_exported(FeatureClass::Opening, row.gml_id.as_deref(), row.id);

        Ok(Some(Opening {
            kind,
            gml_id: row.gml_id,
            name: row.name,
            description: row.description,
            geometry,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citydb_core::{Counters, ExportConfig, GeometryPayload, GeometryRow, GmlIdLookup, MemorySource};

    fn surface_row(id: i64, surface_type: &str, lod2: Option<i64>) -> ThematicSurfaceRow {
        ThematicSurfaceRow {
            id,
            owner: SurfaceOwner::Building(1),
            gml_id: Some(format!("surf_{id}")),
            name: None,
            description: None,
            surface_type: surface_type.into(),
            lod_multi_surface_ids: [lod2, None, None],
        }
    }

    fn multi_surface(source: &mut MemorySource, root: i64) {
        let square = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        source
            .add_geometry(GeometryRow::container(root, None, root))
            .add_geometry(GeometryRow::polygon(root + 1, Some(root), root, GeometryPayload::single_ring(&square)));
    }

    #[test]
    fn unknown_surface_types_are_skipped() {
        let mut source = MemorySource::new();
        multi_surface(&mut source, 100);
        source
            .add_thematic_surface(surface_row(10, "RoofSurface", Some(100)))
            .add_thematic_surface(surface_row(11, "RasterRelief", None))
            .add_thematic_surface(surface_row(12, "WallSurface", None));

        let config = ExportConfig::default();
        let lookup = GmlIdLookup::new();
        let counters = Counters::new();
        let ctx = ExportContext::new(&source, &config, &lookup, &counters);
        let surfaces = ThematicSurfaceExporter::new(&ctx)
            .read(SurfaceOwner::Building(1))
            .unwrap();

        let kinds: Vec<_> = surfaces.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![BoundarySurfaceKind::RoofSurface, BoundarySurfaceKind::WallSurface]);
        assert_eq!(surfaces[0].geometry.len(), 1);
        assert_eq!(surfaces[0].geometry[0].lod, 2);
        assert!(surfaces[1].geometry.is_empty());
        assert_eq!(counters.feature_count(FeatureClass::BoundarySurface), 2);
    }

    #[test]
    fn openings_keep_their_lod_slots() {
        let mut source = MemorySource::new();
        multi_surface(&mut source, 200);
        source
            .add_thematic_surface(surface_row(10, "Wall", None))
            .add_opening(OpeningRow {
                id: 20,
                thematic_surface_id: 10,
                gml_id: Some("win_1".into()),
                name: None,
                description: None,
                opening_type: "Window".into(),
                lod_multi_surface_ids: [None, Some(200)],
            })
            .add_opening(OpeningRow {
                id: 21,
                thematic_surface_id: 10,
                gml_id: None,
                name: None,
                description: None,
                opening_type: "Skylight".into(),
                lod_multi_surface_ids: [None, None],
            });

        let config = ExportConfig::default();
        let lookup = GmlIdLookup::new();
        let counters = Counters::new();
        let ctx = ExportContext::new(&source, &config, &lookup, &counters);
        let surfaces = ThematicSurfaceExporter::new(&ctx)
            .read(SurfaceOwner::Building(1))
            .unwrap();

        let openings = &surfaces[0].openings;
        assert_eq!(openings.len(), 1);
        assert_eq!(openings[0].kind, OpeningKind::Window);
        assert_eq!(openings[0].geometry[0].lod, 4);
        assert_eq!(counters.feature_count(FeatureClass::Opening), 1);
    }
}
