// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discriminants for exported geometry and feature kinds.
//!
//! Both enums are dense (`repr(u8)` starting at zero) so they can index the
//! fixed-size counter arrays in [`crate::counter`].

use serde::{Deserialize, Serialize};

/// GML geometry kinds produced by surface geometry reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum GeometryClass {
    Polygon = 0,
    OrientableSurface = 1,
    CompositeSurface = 2,
    TriangulatedSurface = 3,
    Solid = 4,
    CompositeSolid = 5,
    MultiSolid = 6,
    MultiSurface = 7,
}

impl GeometryClass {
    pub const ALL: [GeometryClass; 8] = [
        GeometryClass::Polygon,
        GeometryClass::OrientableSurface,
        GeometryClass::CompositeSurface,
        GeometryClass::TriangulatedSurface,
        GeometryClass::Solid,
        GeometryClass::CompositeSolid,
        GeometryClass::MultiSolid,
        GeometryClass::MultiSurface,
    ];

    /// Returns the GML element name.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryClass::Polygon => "Polygon",
            GeometryClass::OrientableSurface => "OrientableSurface",
            GeometryClass::CompositeSurface => "CompositeSurface",
            GeometryClass::TriangulatedSurface => "TriangulatedSurface",
            GeometryClass::Solid => "Solid",
            GeometryClass::CompositeSolid => "CompositeSolid",
            GeometryClass::MultiSolid => "MultiSolid",
            GeometryClass::MultiSurface => "MultiSurface",
        }
    }

    /// Returns `true` for kinds that may be a member of a composite or multi surface.
    pub fn is_surface_member(&self) -> bool {
        matches!(
            self,
            GeometryClass::Polygon
                | GeometryClass::OrientableSurface
                | GeometryClass::CompositeSurface
                | GeometryClass::TriangulatedSurface
        )
    }

    /// Returns `true` for kinds that may be a member of a composite or multi solid.
    pub fn is_solid_member(&self) -> bool {
        matches!(self, GeometryClass::Solid | GeometryClass::CompositeSolid)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for GeometryClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CityGML feature kinds produced by the feature exporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum FeatureClass {
    Building = 0,
    BuildingPart = 1,
    Room = 2,
    BoundarySurface = 3,
    Opening = 4,
    Appearance = 5,
    CityObjectGroup = 6,
}

impl FeatureClass {
    pub const ALL: [FeatureClass; 7] = [
        FeatureClass::Building,
        FeatureClass::BuildingPart,
        FeatureClass::Room,
        FeatureClass::BoundarySurface,
        FeatureClass::Opening,
        FeatureClass::Appearance,
        FeatureClass::CityObjectGroup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureClass::Building => "Building",
            FeatureClass::BuildingPart => "BuildingPart",
            FeatureClass::Room => "Room",
            FeatureClass::BoundarySurface => "BoundarySurface",
            FeatureClass::Opening => "Opening",
            FeatureClass::Appearance => "Appearance",
            FeatureClass::CityObjectGroup => "CityObjectGroup",
        }
    }

    /// Returns `true` for classes that are exported as top-level features.
    pub fn is_top_level(&self) -> bool {
        matches!(self, FeatureClass::Building | FeatureClass::CityObjectGroup)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for FeatureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
