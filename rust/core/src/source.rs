// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Row-source seams between the exporters and the database.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::class::FeatureClass;
use crate::error::Result;
use crate::row::{
    AppearanceRow, BuildingRow, CityObjectGroupRow, GeometryRow, GroupMemberRow, OpeningRow,
    RoomRow, RootObject, SurfaceOwner, ThematicSurfaceRow,
};

/// Selects the top-level objects of an export run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportFilter {
    /// Top-level classes to export; empty selects all.
    pub feature_classes: FxHashSet<FeatureClass>,
    /// gml:ids to export; empty selects all.
    pub gml_ids: FxHashSet<String>,
}

impl ExportFilter {
    pub fn with_class(mut self, class: FeatureClass) -> Self {
        self.feature_classes.insert(class);
        self
    }

    pub fn with_gml_id(mut self, gml_id: impl Into<String>) -> Self {
        self.gml_ids.insert(gml_id.into());
        self
    }

    pub fn matches(&self, object: &RootObject) -> bool {
        let class_ok =
            self.feature_classes.is_empty() || self.feature_classes.contains(&object.class);
        let id_ok = self.gml_ids.is_empty()
            || object
                .gml_id
                .as_ref()
                .is_some_and(|id| self.gml_ids.contains(id));
        class_ok && id_ok
    }
}

/// One database connection, owned by a single export job.
///
/// Every query returns its rows in storage order; child order inside the
/// exported features follows that order.
pub trait RowSource: Send {
    /// All `SURFACE_GEOMETRY` rows sharing `root_id`, optionally transformed.
    fn surface_geometry(&self, root_id: i64, target_srid: Option<u32>) -> Result<Vec<GeometryRow>>;

    /// All building and building part rows below a building root.
    fn buildings(&self, building_root_id: i64) -> Result<Vec<BuildingRow>>;

    fn thematic_surfaces(&self, owner: SurfaceOwner) -> Result<Vec<ThematicSurfaceRow>>;

    fn openings(&self, thematic_surface_id: i64) -> Result<Vec<OpeningRow>>;

    fn rooms(&self, building_id: i64) -> Result<Vec<RoomRow>>;

    fn appearances(&self, cityobject_id: i64) -> Result<Vec<AppearanceRow>>;

    fn city_object_group(&self, group_id: i64) -> Result<Option<CityObjectGroupRow>>;

    fn group_members(&self, group_id: i64) -> Result<Vec<GroupMemberRow>>;

    /// Top-level objects matching `filter`, in id order.
    fn root_objects(&self, filter: &ExportFilter) -> Result<Vec<RootObject>>;
}

/// Hands out one connection per export job.
pub trait ConnectionProvider: Send + Sync {
    fn connect(&self) -> Result<Box<dyn RowSource + '_>>;
}
