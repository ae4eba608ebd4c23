// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room export (LOD4 interiors).

use citydb_core::parse::split_tokens;
use citydb_core::{FeatureClass, RoomRow, SurfaceOwner};

use crate::citygml::{LodKind, Room};
use crate::context::ExportContext;
use crate::error::Result;
use crate::thematic_surface::ThematicSurfaceExporter;

pub struct RoomExporter<'c, 'a> {
    ctx: &'c ExportContext<'a>,
}

impl<'c, 'a> RoomExporter<'c, 'a> {
    pub fn new(ctx: &'c ExportContext<'a>) -> Self {
        Self { ctx }
    }

    /// Reads the rooms of a building or building part.
    pub fn read(&self, building_id: i64) -> Result<Vec<Room>> {
        self.ctx
            .source
            .rooms(building_id)?
            .into_iter()
            .map(|row| self.room(row))
            .collect()
    }

    fn room(&self, row: RoomRow) -> Result<Room> {
        let geometry = self.ctx.lod_geometries([
            (4, LodKind::Solid, row.lod4_solid_id),
            (4, LodKind::MultiSurface, row.lod4_multi_surface_id),
        ])?;
        let boundary_surfaces = ThematicSurfaceExporter::new(self.ctx).read(SurfaceOwner::Room(row.id))?;
        let appearances = self.ctx.appearances(row.id)?;
        self.ctx.feature_exported(FeatureClass::Room, row.gml_id.as_deref(), row.id);

        Ok(Room {
            function: split_tokens(row.function.as_deref()),
            usage: split_tokens(row.usage.as_deref()),
            gml_id: row.gml_id,
            name: row.name,
            description: row.description,
            class: row.class,
            geometry,
            boundary_surfaces,
            appearances,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citydb_core::{Counters, ExportConfig, GmlIdLookup, MemorySource, ThematicSurfaceRow};

    #[test]
    fn rooms_carry_their_own_boundary_surfaces() {
        let mut source = MemorySource::new();
        source
            .add_room(RoomRow {
                id: 7,
                building_id: 1,
                gml_id: Some("room_7".into()),
                function: Some("1000 2000".into()),
                ..RoomRow::default()
            })
            .add_thematic_surface(ThematicSurfaceRow {
                id: 70,
                owner: SurfaceOwner::Room(7),
                gml_id: None,
                name: None,
                description: None,
                surface_type: "FloorSurface".into(),
                lod_multi_surface_ids: [None; 3],
            })
            .add_thematic_surface(ThematicSurfaceRow {
                id: 71,
                owner: SurfaceOwner::Building(1),
                gml_id: None,
                name: None,
                description: None,
                surface_type: "RoofSurface".into(),
                lod_multi_surface_ids: [None; 3],
            });

        let config = ExportConfig::default();
        let lookup = GmlIdLookup::new();
        let counters = Counters::new();
        let ctx = ExportContext::new(&source, &config, &lookup, &counters);
        let rooms = RoomExporter::new(&ctx).read(1).unwrap();

        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].function, vec!["1000", "2000"]);
        assert_eq!(rooms[0].boundary_surfaces.len(), 1);
        assert_eq!(counters.feature_count(FeatureClass::Room), 1);
        // group export is off, so nothing is registered
        assert!(lookup.is_empty());
    }
}
