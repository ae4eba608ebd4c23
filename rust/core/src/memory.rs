// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory row source.
//!
//! [`MemorySource`] keeps every table as a `Vec` in insertion order and
//! answers the [`RowSource`] queries with linear scans. It is meant for tests
//! and for exporting rows that were produced programmatically.
//!
//! ## Limitations
//!
//! - Coordinates are stored in a single SRID. Queries for another target
//!   SRID fail with [`Error::Unsupported`]; there is no transformation.
//! - Queries are linear scans; fine for thousands of rows, not millions.

use rustc_hash::FxHashSet;

use crate::class::FeatureClass;
use crate::error::{Error, Result};
use crate::row::{
    AppearanceRow, BuildingRow, CityObjectGroupRow, GeometryRow, GroupMemberRow, OpeningRow,
    RoomRow, RootObject, SurfaceOwner, ThematicSurfaceRow,
};
use crate::source::{ConnectionProvider, ExportFilter, RowSource};

/// In-memory tables implementing [`RowSource`] and [`ConnectionProvider`].
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    srid: Option<u32>,
    geometries: Vec<GeometryRow>,
    buildings: Vec<BuildingRow>,
    thematic_surfaces: Vec<ThematicSurfaceRow>,
    openings: Vec<OpeningRow>,
    rooms: Vec<RoomRow>,
    appearances: Vec<AppearanceRow>,
    groups: Vec<CityObjectGroupRow>,
    members: Vec<GroupMemberRow>,
    failing_buildings: FxHashSet<i64>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the SRID the stored coordinates are in.
    pub fn with_srid(mut self, srid: u32) -> Self {
        self.srid = Some(srid);
        self
    }

    pub fn add_geometry(&mut self, row: GeometryRow) -> &mut Self {
        self.geometries.push(row);
        self
    }

    pub fn add_geometries(&mut self, rows: impl IntoIterator<Item = GeometryRow>) -> &mut Self {
        self.geometries.extend(rows);
        self
    }

    pub fn add_building(&mut self, row: BuildingRow) -> &mut Self {
        self.buildings.push(row);
        self
    }

    pub fn add_thematic_surface(&mut self, row: ThematicSurfaceRow) -> &mut Self {
        self.thematic_surfaces.push(row);
        self
    }

    pub fn add_opening(&mut self, row: OpeningRow) -> &mut Self {
        self.openings.push(row);
        self
    }

    pub fn add_room(&mut self, row: RoomRow) -> &mut Self {
        self.rooms.push(row);
        self
    }

    pub fn add_appearance(&mut self, row: AppearanceRow) -> &mut Self {
        self.appearances.push(row);
        self
    }

    pub fn add_group(&mut self, row: CityObjectGroupRow) -> &mut Self {
        self.groups.push(row);
        self
    }

    pub fn add_group_member(&mut self, row: GroupMemberRow) -> &mut Self {
        self.members.push(row);
        self
    }

    /// Makes every building query for this root fail, to exercise job failures.
    pub fn fail_building(&mut self, building_root_id: i64) -> &mut Self {
        self.failing_buildings.insert(building_root_id);
        self
    }

    fn check_srid(&self, target_srid: Option<u32>) -> Result<()> {
        match (target_srid, self.srid) {
            (Some(target), Some(stored)) if target != stored => Err(Error::Unsupported(format!(
                "coordinate transformation from SRID {stored} to {target}"
            ))),
            (Some(target), None) => Err(Error::Unsupported(format!(
                "coordinate transformation to SRID {target} without a source SRID"
            ))),
            _ => Ok(()),
        }
    }
}

impl RowSource for MemorySource {
    fn surface_geometry(&self, root_id: i64, target_srid: Option<u32>) -> Result<Vec<GeometryRow>> {
        self.check_srid(target_srid)?;
        Ok(self
            .geometries
            .iter()
            .filter(|row| row.root_id == root_id)
            .cloned()
            .collect())
    }

    fn buildings(&self, building_root_id: i64) -> Result<Vec<BuildingRow>> {
        if self.failing_buildings.contains(&building_root_id) {
            return Err(Error::source(
                "BUILDING",
                format!("query failed for building root {building_root_id}"),
            ));
        }
        Ok(self
            .buildings
            .iter()
            .filter(|row| row.root_id == building_root_id)
            .cloned()
            .collect())
    }

    fn thematic_surfaces(&self, owner: SurfaceOwner) -> Result<Vec<ThematicSurfaceRow>> {
        Ok(self
            .thematic_surfaces
            .iter()
            .filter(|row| row.owner == owner)
            .cloned()
            .collect())
    }

    fn openings(&self, thematic_surface_id: i64) -> Result<Vec<OpeningRow>> {
        Ok(self
            .openings
            .iter()
            .filter(|row| row.thematic_surface_id == thematic_surface_id)
            .cloned()
            .collect())
    }

    fn rooms(&self, building_id: i64) -> Result<Vec<RoomRow>> {
        Ok(self
            .rooms
            .iter()
            .filter(|row| row.building_id == building_id)
            .cloned()
            .collect())
    }

    fn appearances(&self, cityobject_id: i64) -> Result<Vec<AppearanceRow>> {
        Ok(self
            .appearances
            .iter()
            .filter(|row| row.cityobject_id == cityobject_id)
            .cloned()
            .collect())
    }

    fn city_object_group(&self, group_id: i64) -> Result<Option<CityObjectGroupRow>> {
        Ok(self.groups.iter().find(|row| row.id == group_id).cloned())
    }

    fn group_members(&self, group_id: i64) -> Result<Vec<GroupMemberRow>> {
        Ok(self
            .members
            .iter()
            .filter(|row| row.group_id == group_id)
            .cloned()
            .collect())
    }

    fn root_objects(&self, filter: &ExportFilter) -> Result<Vec<RootObject>> {
        let buildings = self
            .buildings
            .iter()
            .filter(|row| row.parent_id.is_none())
            .map(|row| RootObject {
                id: row.id,
                class: FeatureClass::Building,
                gml_id: row.gml_id.clone(),
            });
        let groups = self.groups.iter().map(|row| RootObject {
            id: row.id,
            class: FeatureClass::CityObjectGroup,
            gml_id: row.gml_id.clone(),
        });

        let mut objects: Vec<RootObject> = buildings
            .chain(groups)
            .filter(|object| filter.matches(object))
            .collect();
        objects.sort_by_key(|object| object.id);
        Ok(objects)
    }
}

impl ConnectionProvider for MemorySource {
    fn connect(&self) -> Result<Box<dyn RowSource + '_>> {
        Ok(Box::new(MemoryConnection { source: self }))
    }
}

/// Borrowed connection handed to a single export job.
struct MemoryConnection<'a> {
    source: &'a MemorySource,
}

impl RowSource for MemoryConnection<'_> {
    fn surface_geometry(&self, root_id: i64, target_srid: Option<u32>) -> Result<Vec<GeometryRow>> {
        self.source.surface_geometry(root_id, target_srid)
    }

    fn buildings(&self, building_root_id: i64) -> Result<Vec<BuildingRow>> {
        self.source.buildings(building_root_id)
    }

    fn thematic_surfaces(&self, owner: SurfaceOwner) -> Result<Vec<ThematicSurfaceRow>> {
        self.source.thematic_surfaces(owner)
    }

    fn openings(&self, thematic_surface_id: i64) -> Result<Vec<OpeningRow>> {
        self.source.openings(thematic_surface_id)
    }

    fn rooms(&self, building_id: i64) -> Result<Vec<RoomRow>> {
        self.source.rooms(building_id)
    }

    fn appearances(&self, cityobject_id: i64) -> Result<Vec<AppearanceRow>> {
        self.source.appearances(cityobject_id)
    }

    fn city_object_group(&self, group_id: i64) -> Result<Option<CityObjectGroupRow>> {
        self.source.city_object_group(group_id)
    }

    fn group_members(&self, group_id: i64) -> Result<Vec<GroupMemberRow>> {
        self.source.group_members(group_id)
    }

    fn root_objects(&self, filter: &ExportFilter) -> Result<Vec<RootObject>> {
        self.source.root_objects(filter)
    }
}
