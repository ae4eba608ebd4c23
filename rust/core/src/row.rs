// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rows as read from the city database tables.

use serde::{Deserialize, Serialize};

use crate::class::FeatureClass;
use crate::tree::TreePayload;

/// SDO element type of an exterior polygon ring.
pub const ETYPE_EXTERIOR_RING: u32 = 1003;
/// SDO element type of an interior polygon ring.
pub const ETYPE_INTERIOR_RING: u32 = 2003;
/// SDO interpretation for rings given by straight-line vertices.
pub const INTERPRETATION_LINEAR: u32 = 1;

/// Maps a stored parent id to the tree root sentinel (`0` or `NULL` → `None`).
pub fn parent_ref(raw: Option<i64>) -> Option<i64> {
    raw.filter(|&id| id != 0)
}

/// Inline polygon coordinates in SDO encoding.
///
/// `elem_info` holds one `(offset, etype, interpretation)` triplet per ring;
/// offsets are 1-based positions in `ordinates`. A ring ends where the next
/// one starts, the last ring ends at the end of `ordinates`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryPayload {
    pub elem_info: Vec<u32>,
    pub ordinates: Vec<f64>,
}

impl GeometryPayload {
    /// Encodes rings of `[x, y, z]` points; the first ring is the exterior.
    pub fn from_rings<R: AsRef<[[f64; 3]]>>(rings: &[R]) -> Self {
        let mut payload = Self::default();
        for (i, ring) in rings.iter().enumerate() {
            let etype = if i == 0 {
                ETYPE_EXTERIOR_RING
            } else {
                ETYPE_INTERIOR_RING
            };
            payload.elem_info.extend([
                payload.ordinates.len() as u32 + 1,
                etype,
                INTERPRETATION_LINEAR,
            ]);
            payload
                .ordinates
                .extend(ring.as_ref().iter().flat_map(|p| p.iter().copied()));
        }
        payload
    }

    /// Encodes a polygon without holes.
    pub fn single_ring(points: &[[f64; 3]]) -> Self {
        Self::from_rings(&[points])
    }
}

/// A row of the `SURFACE_GEOMETRY` table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryRow {
    pub id: i64,
    pub gml_id: Option<String>,
    pub parent_id: Option<i64>,
    pub root_id: i64,
    pub is_solid: bool,
    pub is_composite: bool,
    pub is_triangulated: bool,
    pub is_xlink: bool,
    pub is_reverse: bool,
    /// Present on polygon leaves only.
    pub geometry: Option<GeometryPayload>,
}

impl GeometryRow {
    /// A container row; its kind is set with the flag builders.
    pub fn container(id: i64, parent_id: Option<i64>, root_id: i64) -> Self {
        Self {
            id,
            parent_id: parent_ref(parent_id),
            root_id,
            ..Self::default()
        }
    }

    /// A polygon leaf row.
    pub fn polygon(id: i64, parent_id: Option<i64>, root_id: i64, payload: GeometryPayload) -> Self {
        Self {
            geometry: Some(payload),
            ..Self::container(id, parent_id, root_id)
        }
    }

    pub fn with_gml_id(mut self, gml_id: impl Into<String>) -> Self {
        self.gml_id = Some(gml_id.into());
        self
    }

    pub fn solid(mut self) -> Self {
        self.is_solid = true;
        self
    }

    pub fn composite(mut self) -> Self {
        self.is_composite = true;
        self
    }

    pub fn triangulated(mut self) -> Self {
        self.is_triangulated = true;
        self
    }

    pub fn xlink(mut self) -> Self {
        self.is_xlink = true;
        self
    }

    pub fn reversed(mut self) -> Self {
        self.is_reverse = true;
        self
    }
}

impl TreePayload for GeometryRow {
    fn is_leaf(&self) -> bool {
        self.geometry.is_some()
    }
}

/// Bounding box stored with a city object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeRow {
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

/// A row of the `BUILDING` table joined with its city object attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildingRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub root_id: i64,
    pub gml_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub class: Option<String>,
    /// Whitespace-delimited code list.
    pub function: Option<String>,
    /// Whitespace-delimited code list.
    pub usage: Option<String>,
    pub year_of_construction: Option<i32>,
    pub year_of_demolition: Option<i32>,
    pub roof_type: Option<String>,
    pub measured_height: Option<f64>,
    pub measured_height_unit: Option<String>,
    pub storeys_above_ground: Option<u32>,
    pub storeys_below_ground: Option<u32>,
    /// Whitespace-delimited numbers.
    pub storey_heights_above_ground: Option<String>,
    pub storey_heights_above_ground_unit: Option<String>,
    /// Whitespace-delimited numbers.
    pub storey_heights_below_ground: Option<String>,
    pub storey_heights_below_ground_unit: Option<String>,
    /// Root surface geometry ids of the LOD1..LOD4 solids.
    pub lod_solid_ids: [Option<i64>; 4],
    /// Root surface geometry ids of the LOD1..LOD4 multi-surfaces.
    pub lod_multi_surface_ids: [Option<i64>; 4],
    pub envelope: Option<EnvelopeRow>,
}

impl BuildingRow {
    pub fn new(id: i64, parent_id: Option<i64>, root_id: i64) -> Self {
        Self {
            id,
            parent_id: parent_ref(parent_id),
            root_id,
            ..Self::default()
        }
    }
}

impl TreePayload for BuildingRow {
    fn is_leaf(&self) -> bool {
        false
    }
}

/// Owner of a thematic surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceOwner {
    Building(i64),
    Room(i64),
}

/// A row of the `THEMATIC_SURFACE` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThematicSurfaceRow {
    pub id: i64,
    pub owner: SurfaceOwner,
    pub gml_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// CityGML type name such as `RoofSurface`.
    pub surface_type: String,
    /// Root surface geometry ids of the LOD2..LOD4 multi-surfaces.
    pub lod_multi_surface_ids: [Option<i64>; 3],
}

/// A row of the `OPENING` table joined through `OPENING_TO_THEM_SURFACE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningRow {
    pub id: i64,
    pub thematic_surface_id: i64,
    pub gml_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// `Window` or `Door`.
    pub opening_type: String,
    /// Root surface geometry ids of the LOD3 and LOD4 multi-surfaces.
    pub lod_multi_surface_ids: [Option<i64>; 2],
}

/// A row of the `ROOM` table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoomRow {
    pub id: i64,
    pub building_id: i64,
    pub gml_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub class: Option<String>,
    pub function: Option<String>,
    pub usage: Option<String>,
    pub lod4_solid_id: Option<i64>,
    pub lod4_multi_surface_id: Option<i64>,
}

/// One row of `APPEARANCE ⋈ SURFACE_DATA ⋈ TEXTUREPARAM`.
///
/// An appearance with several surface data, each with several targets, is
/// spread over several rows sharing `appearance_id` and `surface_data_id`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppearanceRow {
    pub appearance_id: i64,
    pub cityobject_id: i64,
    pub appearance_gml_id: Option<String>,
    pub theme: Option<String>,
    pub surface_data_id: Option<i64>,
    pub surface_data_gml_id: Option<String>,
    /// CityGML type name such as `X3DMaterial` or `ParameterizedTexture`.
    pub surface_data_type: Option<String>,
    pub is_front: bool,
    pub diffuse_color: Option<[f64; 3]>,
    pub transparency: Option<f64>,
    pub shininess: Option<f64>,
    pub ambient_intensity: Option<f64>,
    pub image_uri: Option<String>,
    pub mime_type: Option<String>,
    pub target_geometry_id: Option<i64>,
    /// Whitespace-delimited `s t` pairs of the exterior ring.
    pub texture_coordinates: Option<String>,
}

/// A row of the `CITYOBJECTGROUP` table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CityObjectGroupRow {
    pub id: i64,
    pub gml_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub class: Option<String>,
    pub function: Option<String>,
    pub usage: Option<String>,
    pub brep_id: Option<i64>,
    pub parent_gml_id: Option<String>,
    pub envelope: Option<EnvelopeRow>,
}

/// A row of `GROUP_TO_CITYOBJECT`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMemberRow {
    pub group_id: i64,
    pub member_id: i64,
    pub member_gml_id: String,
    pub role: Option<String>,
}

/// A top-level object selected for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootObject {
    pub id: i64,
    pub class: FeatureClass,
    pub gml_id: Option<String>,
}
