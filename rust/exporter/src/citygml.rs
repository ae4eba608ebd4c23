// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CityGML feature model handed to feature writers.
//!
//! Only the parts of the building, appearance and group modules the
//! exporters populate are modelled. Every type serialises with `serde`;
//! optional and empty members are skipped.

use citydb_core::{EnvelopeRow, FeatureClass};
use citydb_geometry::{Point3, SurfaceGeometryResult};
use serde::Serialize;

/// Bounding box of a feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srs_name: Option<String>,
    pub lower_corner: Point3<f64>,
    pub upper_corner: Point3<f64>,
}

impl Envelope {
    pub fn from_row(row: &EnvelopeRow, srs_name: Option<String>) -> Self {
        let [lx, ly, lz] = row.lower;
        let [ux, uy, uz] = row.upper;
        Self {
            srs_name,
            lower_corner: Point3::new(lx, ly, lz),
            upper_corner: Point3::new(ux, uy, uz),
        }
    }

    /// Smallest envelope covering all given (min, max) bounds
    pub fn covering(
        bounds: impl IntoIterator<Item = (Point3<f64>, Point3<f64>)>,
        srs_name: Option<String>,
    ) -> Option<Self> {
        let (lower, upper) = bounds
            .into_iter()
            .reduce(|(min_a, max_a), (min_b, max_b)| (min_a.inf(&min_b), max_a.sup(&max_b)))?;
        Some(Self {
            srs_name,
            lower_corner: lower,
            upper_corner: upper,
        })
    }
}

/// Value with unit of measure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measure {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uom: Option<String>,
}

/// List of values sharing one unit of measure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureList {
    pub values: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uom: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LodKind {
    Solid,
    MultiSurface,
}

/// Geometry of one level-of-detail slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LodGeometry {
    pub lod: u8,
    pub kind: LodKind,
    pub geometry: SurfaceGeometryResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildingKind {
    Building,
    BuildingPart,
}

impl BuildingKind {
    pub fn feature_class(&self) -> FeatureClass {
        match self {
            BuildingKind::Building => FeatureClass::Building,
            BuildingKind::BuildingPart => FeatureClass::BuildingPart,
        }
    }
}

/// Building or building part with its nested features
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Building {
    pub kind: BuildingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gml_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub function: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub usage: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_of_construction: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_of_demolition: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roof_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured_height: Option<Measure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storeys_above_ground: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storeys_below_ground: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storey_heights_above_ground: Option<MeasureList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storey_heights_below_ground: Option<MeasureList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope: Option<Envelope>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub geometry: Vec<LodGeometry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub boundary_surfaces: Vec<BoundarySurface>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rooms: Vec<Room>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub appearances: Vec<Appearance>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Building>,
}

impl Building {
    /// Number of buildings in this subtree, including itself
    pub fn part_count(&self) -> usize {
        1 + self.parts.iter().map(Building::part_count).sum::<usize>()
    }
}

/// Thematic boundary surface types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BoundarySurfaceKind {
    RoofSurface,
    WallSurface,
    GroundSurface,
    ClosureSurface,
    FloorSurface,
    OuterFloorSurface,
    InteriorWallSurface,
    CeilingSurface,
    OuterCeilingSurface,
}

impl BoundarySurfaceKind {
    /// Parses a type name, with or without the `Surface` suffix.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let name = name.strip_suffix("Surface").unwrap_or(name);
        Some(match name {
            "Roof" => BoundarySurfaceKind::RoofSurface,
            "Wall" => BoundarySurfaceKind::WallSurface,
            "Ground" => BoundarySurfaceKind::GroundSurface,
            "Closure" => BoundarySurfaceKind::ClosureSurface,
            "Floor" => BoundarySurfaceKind::FloorSurface,
            "OuterFloor" => BoundarySurfaceKind::OuterFloorSurface,
            "InteriorWall" => BoundarySurfaceKind::InteriorWallSurface,
            "Ceiling" => BoundarySurfaceKind::CeilingSurface,
            "OuterCeiling" => BoundarySurfaceKind::OuterCeilingSurface,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundarySurface {
    pub kind: BoundarySurfaceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gml_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub geometry: Vec<LodGeometry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub openings: Vec<Opening>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub appearances: Vec<Appearance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OpeningKind {
    Window,
    Door,
}

impl OpeningKind {
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name.trim() {
            "Window" => Some(OpeningKind::Window),
            "Door" => Some(OpeningKind::Door),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opening {
    pub kind: OpeningKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gml_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub geometry: Vec<LodGeometry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gml_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub function: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub usage: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub geometry: Vec<LodGeometry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub boundary_surfaces: Vec<BoundarySurface>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub appearances: Vec<Appearance>,
}

/// Named set of surface data of one city object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Appearance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gml_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub surface_data: Vec<SurfaceData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SurfaceData {
    X3DMaterial(X3DMaterial),
    ParameterizedTexture(ParameterizedTexture),
}

impl SurfaceData {
    pub fn gml_id(&self) -> Option<&str> {
        match self {
            SurfaceData::X3DMaterial(m) => m.gml_id.as_deref(),
            SurfaceData::ParameterizedTexture(t) => t.gml_id.as_deref(),
        }
    }

    pub fn target_count(&self) -> usize {
        match self {
            SurfaceData::X3DMaterial(m) => m.targets.len(),
            SurfaceData::ParameterizedTexture(t) => t.targets.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct X3DMaterial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gml_id: Option<String>,
    pub is_front: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diffuse_color: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shininess: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambient_intensity: Option<f64>,
    /// `#gmlId` references of the surfaces the material applies to
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterizedTexture {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gml_id: Option<String>,
    pub is_front: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub targets: Vec<TextureTarget>,
}

/// Texture coordinates of one target polygon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureTarget {
    /// `#gmlId` of the target polygon
    pub uri: String,
    /// `#gmlId_0` of the polygon's exterior ring
    pub ring: String,
    pub coordinates: Vec<f64>,
}

/// Reference from a group to one of its members
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMember {
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityObjectGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gml_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub function: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub usage: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope: Option<Envelope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<SurfaceGeometryResult>,
    pub members: Vec<GroupMember>,
    /// `#gmlId` of the parent group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub appearances: Vec<Appearance>,
}

/// Top-level feature passed to the writer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CityObject {
    Building(Building),
    CityObjectGroup(CityObjectGroup),
}

impl CityObject {
    pub fn class(&self) -> FeatureClass {
        match self {
            CityObject::Building(b) => b.kind.feature_class(),
            CityObject::CityObjectGroup(_) => FeatureClass::CityObjectGroup,
        }
    }

    pub fn gml_id(&self) -> Option<&str> {
        match self {
            CityObject::Building(b) => b.gml_id.as_deref(),
            CityObject::CityObjectGroup(g) => g.gml_id.as_deref(),
        }
    }
}
