// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GML geometry object model

use citydb_core::GeometryClass;
use nalgebra::Point3;
use serde::Serialize;

/// Closed ring of 3D positions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearRing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub positions: Vec<Point3<f64>>,
}

/// Planar surface with one exterior and any number of interior rings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub exterior: LinearRing,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interior: Vec<LinearRing>,
}

/// Orientation marker of an orientable surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    #[serde(rename = "+")]
    Positive,
    #[serde(rename = "-")]
    Negative,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Positive => "+",
            Orientation::Negative => "-",
        }
    }
}

/// Inline member geometry or a reference to geometry written elsewhere
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeometryProperty {
    Inline(Box<Geometry>),
    Href { href: String },
}

impl GeometryProperty {
    pub fn href(&self) -> Option<&str> {
        match self {
            GeometryProperty::Href { href } => Some(href),
            GeometryProperty::Inline(_) => None,
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match self {
            GeometryProperty::Inline(geometry) => Some(geometry),
            GeometryProperty::Href { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrientableSurface {
    pub orientation: Orientation,
    pub base_surface: GeometryProperty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Triangle {
    pub exterior: LinearRing,
}

/// Solid bounded by a single exterior shell (no cavities)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solid {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub exterior: GeometryProperty,
}

/// Aggregate of member geometries; used for composite and multi geometries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub members: Vec<GeometryProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriangulatedSurface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub patches: Vec<Triangle>,
}

/// Reconstructed GML geometry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon(Polygon),
    OrientableSurface(OrientableSurface),
    CompositeSurface(Aggregate),
    TriangulatedSurface(TriangulatedSurface),
    Solid(Solid),
    CompositeSolid(Aggregate),
    MultiSolid(Aggregate),
    MultiSurface(Aggregate),
}

impl Geometry {
    pub fn class(&self) -> GeometryClass {
        match self {
            Geometry::Polygon(_) => GeometryClass::Polygon,
            Geometry::OrientableSurface(_) => GeometryClass::OrientableSurface,
            Geometry::CompositeSurface(_) => GeometryClass::CompositeSurface,
            Geometry::TriangulatedSurface(_) => GeometryClass::TriangulatedSurface,
            Geometry::Solid(_) => GeometryClass::Solid,
            Geometry::CompositeSolid(_) => GeometryClass::CompositeSolid,
            Geometry::MultiSolid(_) => GeometryClass::MultiSolid,
            Geometry::MultiSurface(_) => GeometryClass::MultiSurface,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Geometry::Polygon(p) => p.id.as_deref(),
            Geometry::OrientableSurface(_) => None,
            Geometry::TriangulatedSurface(t) => t.id.as_deref(),
            Geometry::Solid(s) => s.id.as_deref(),
            Geometry::CompositeSurface(a)
            | Geometry::CompositeSolid(a)
            | Geometry::MultiSolid(a)
            | Geometry::MultiSurface(a) => a.id.as_deref(),
        }
    }

    /// Member properties of aggregate geometries, empty otherwise
    pub fn members(&self) -> &[GeometryProperty] {
        match self {
            Geometry::CompositeSurface(a)
            | Geometry::CompositeSolid(a)
            | Geometry::MultiSolid(a)
            | Geometry::MultiSurface(a) => &a.members,
            _ => &[],
        }
    }

    /// Visit every position of inline geometry; references are not followed
    pub fn for_each_position(&self, visit: &mut impl FnMut(&Point3<f64>)) {
        fn ring(r: &LinearRing, visit: &mut impl FnMut(&Point3<f64>)) {
            r.positions.iter().for_each(|p| visit(p));
        }
        fn property(p: &GeometryProperty, visit: &mut impl FnMut(&Point3<f64>)) {
            if let GeometryProperty::Inline(g) = p {
                g.for_each_position(visit);
            }
        }

        match self {
            Geometry::Polygon(p) => {
                ring(&p.exterior, visit);
                p.interior.iter().for_each(|r| ring(r, visit));
            }
            Geometry::OrientableSurface(o) => property(&o.base_surface, visit),
            Geometry::TriangulatedSurface(t) => t.patches.iter().for_each(|tri| ring(&tri.exterior, visit)),
            Geometry::Solid(s) => property(&s.exterior, visit),
            Geometry::CompositeSurface(a)
            | Geometry::CompositeSolid(a)
            | Geometry::MultiSolid(a)
            | Geometry::MultiSurface(a) => a.members.iter().for_each(|m| property(m, visit)),
        }
    }

    /// Axis-aligned bounds of inline positions as (min, max)
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut bounds: Option<(Point3<f64>, Point3<f64>)> = None;
        self.for_each_position(&mut |p| {
            bounds = Some(match bounds {
                None => (*p, *p),
                Some((min, max)) => (min.inf(p), max.sup(p)),
            });
        });
        bounds
    }

    /// Number of inline polygons and triangle patches
    pub fn polygon_count(&self) -> usize {
        match self {
            Geometry::Polygon(_) => 1,
            Geometry::TriangulatedSurface(t) => t.patches.len(),
            Geometry::OrientableSurface(o) => o.base_surface.geometry().map_or(0, Geometry::polygon_count),
            Geometry::Solid(s) => s.exterior.geometry().map_or(0, Geometry::polygon_count),
            Geometry::CompositeSurface(a)
            | Geometry::CompositeSolid(a)
            | Geometry::MultiSolid(a)
            | Geometry::MultiSurface(a) => a
                .members
                .iter()
                .filter_map(GeometryProperty::geometry)
                .map(Geometry::polygon_count)
                .sum(),
        }
    }
}

/// Outcome of rebuilding a geometry subtree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SurfaceGeometryResult {
    /// Geometry written inline
    Geometry(Geometry),
    /// Reference to geometry written by another feature or job
    Reference { href: String, class: GeometryClass },
}

impl SurfaceGeometryResult {
    pub fn class(&self) -> GeometryClass {
        match self {
            SurfaceGeometryResult::Geometry(g) => g.class(),
            SurfaceGeometryResult::Reference { class, .. } => *class,
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match self {
            SurfaceGeometryResult::Geometry(g) => Some(g),
            SurfaceGeometryResult::Reference { .. } => None,
        }
    }

    pub fn href(&self) -> Option<&str> {
        match self {
            SurfaceGeometryResult::Reference { href, .. } => Some(href),
            SurfaceGeometryResult::Geometry(_) => None,
        }
    }

    pub fn into_property(self) -> GeometryProperty {
        match self {
            SurfaceGeometryResult::Geometry(g) => GeometryProperty::Inline(Box::new(g)),
            SurfaceGeometryResult::Reference { href, .. } => GeometryProperty::Href { href },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(z: f64) -> Polygon {
        Polygon {
            id: None,
            exterior: LinearRing {
                id: None,
                positions: vec![
                    Point3::new(0.0, 0.0, z),
                    Point3::new(2.0, 0.0, z),
                    Point3::new(2.0, 3.0, z),
                    Point3::new(0.0, 0.0, z),
                ],
            },
            interior: Vec::new(),
        }
    }

    #[test]
    fn bounds_cover_all_inline_members() {
        let geometry = Geometry::MultiSurface(Aggregate {
            id: None,
            members: vec![
                GeometryProperty::Inline(Box::new(Geometry::Polygon(square(1.0)))),
                GeometryProperty::Href { href: "#elsewhere".into() },
                GeometryProperty::Inline(Box::new(Geometry::Polygon(square(5.0)))),
            ],
        });
        let (min, max) = geometry.bounds().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, 1.0));
        assert_eq!(max, Point3::new(2.0, 3.0, 5.0));
        assert_eq!(geometry.polygon_count(), 2);
    }

    #[test]
    fn reference_result_keeps_class() {
        let result = SurfaceGeometryResult::Reference {
            href: "#shell".into(),
            class: GeometryClass::CompositeSurface,
        };
        assert_eq!(result.class(), GeometryClass::CompositeSurface);
        assert_eq!(result.clone().into_property().href(), Some("#shell"));
        assert!(result.geometry().is_none());
    }

    #[test]
    fn json_carries_type_tags_and_orientation() {
        let wrapped = Geometry::OrientableSurface(OrientableSurface {
            orientation: Orientation::Negative,
            base_surface: GeometryProperty::Inline(Box::new(Geometry::Polygon(square(0.0)))),
        });
        let json = serde_json::to_value(&wrapped).unwrap();
        assert_eq!(json["type"], "OrientableSurface");
        assert_eq!(json["orientation"], "-");
        assert_eq!(json["base_surface"]["type"], "Polygon");
        assert!(json["base_surface"].get("interior").is_none());

        let reference = serde_json::to_value(GeometryProperty::Href { href: "#shell".into() }).unwrap();
        assert_eq!(reference, serde_json::json!({ "href": "#shell" }));
    }
}
