// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CityDB Geometry
//!
//! Rebuilds GML geometry (polygons, surfaces, solids and their aggregates)
//! from the flattened rows of a surface geometry table.

pub mod classify;
pub mod error;
pub mod model;
pub mod rebuild;
pub mod ring;

// Re-export nalgebra types for convenience
pub use nalgebra::Point3;

pub use citydb_core::GeometryClass;
pub use classify::{classify, GeometryNode};
pub use error::{Error, Result};
pub use model::{
    Aggregate, Geometry, GeometryProperty, LinearRing, OrientableSurface, Orientation, Polygon,
    Solid, SurfaceGeometryResult, Triangle, TriangulatedSurface,
};
pub use rebuild::{build_tree, RebuildContext, Rebuilder, SurfaceGeometryExporter};
pub use ring::{decode_rings, reverse_ring};
