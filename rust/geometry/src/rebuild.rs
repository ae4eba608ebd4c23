// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recursive reconstruction of GML geometry from surface geometry trees.
//!
//! [`SurfaceGeometryExporter::read`] loads every row of one geometry root,
//! assembles them with a [`FlatTree`] and hands the tree to a [`Rebuilder`].
//! The rebuilder walks the tree once, classifying every node and composing
//! typed geometry bottom-up:
//!
//! - subtrees that cannot be rebuilt come back as `None` and are left out of
//!   their parent; only an unusable root is reported
//! - shared geometry (xlinks) is written by whichever job claims its gml:id
//!   first; every other occurrence becomes a reference or a renamed copy
//! - reversed rows are wrapped in an orientable surface at the first reversed
//!   node of a path; the open wrapper is threaded down as context

use citydb_core::{
    Counters, ExportConfig, FlatTree, GeometryClass, GeometryRow, GmlIdKind, GmlIdLookup,
    RowSource, XlinkMode,
};
use uuid::Uuid;

use crate::classify::{classify, GeometryNode};
use crate::error::Result;
use crate::model::{
    Aggregate, Geometry, GeometryProperty, LinearRing, OrientableSurface, Orientation, Polygon,
    Solid, SurfaceGeometryResult, Triangle, TriangulatedSurface,
};
use crate::ring::decode_rings;

const DEFAULT_COPY_PREFIX: &str = "UUID_";

/// Context threaded down the recursion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildContext {
    /// An ancestor already opened an orientable surface wrapper.
    pub orientation_open: bool,
}

/// Builds the flat tree for one geometry root.
///
/// The row whose id equals `root_id` becomes the root regardless of its
/// stored parent, so sub-geometries can be read on their own.
pub fn build_tree(
    root_id: i64,
    rows: impl IntoIterator<Item = GeometryRow>,
) -> FlatTree<GeometryRow> {
    let mut tree = FlatTree::new();
    for row in rows {
        let parent = if row.id == root_id { None } else { row.parent_id };
        tree.insert(row.id, row, parent);
    }
    tree
}

/// Rebuilds geometry trees; holds only shared, read-mostly services.
#[derive(Debug, Clone, Copy)]
pub struct Rebuilder<'a> {
    config: &'a ExportConfig,
    lookup: &'a GmlIdLookup,
    counters: &'a Counters,
}

impl<'a> Rebuilder<'a> {
    pub fn new(config: &'a ExportConfig, lookup: &'a GmlIdLookup, counters: &'a Counters) -> Self {
        Self {
            config,
            lookup,
            counters,
        }
    }

    /// Rebuilds a whole tree from its root.
    pub fn rebuild(&self, root: &mut GeometryNode) -> Option<SurfaceGeometryResult> {
        self.rebuild_node(root, RebuildContext::default())
    }

    /// Rebuilds one node under the given context.
    pub fn rebuild_with(
        &self,
        node: &mut GeometryNode,
        ctx: RebuildContext,
    ) -> Option<SurfaceGeometryResult> {
        self.rebuild_node(node, ctx)
    }

    fn rebuild_node(
        &self,
        node: &mut GeometryNode,
        ctx: RebuildContext,
    ) -> Option<SurfaceGeometryResult> {
        let class = classify(node)?;
        let row = node.payload.as_ref()?;

        if let Some(gml_id) = row.gml_id.as_deref() {
            if row.is_xlink {
                if !self.lookup.lookup_and_put(gml_id, row.id, GmlIdKind::Geometry) {
                    return match &self.config.xlink {
                        XlinkMode::Reference => Some(self.reference(
                            gml_id,
                            class,
                            row.is_reverse != ctx.orientation_open,
                        )),
                        XlinkMode::Copy {
                            id_prefix,
                            append_original_id,
                        } => {
                            let renamed =
                                copy_id(gml_id, id_prefix.as_deref(), *append_original_id);
                            let row = node.payload.as_mut()?;
                            row.is_xlink = false;
                            row.gml_id = Some(renamed);
                            self.rebuild_node(node, ctx)
                        }
                    };
                }
            } else if self.config.export_appearance {
                self.lookup.put(gml_id, row.id, GmlIdKind::Geometry);
            }
        }

        let opens_wrapper = row.is_reverse && !ctx.orientation_open;
        let wrap = opens_wrapper || (ctx.orientation_open && !row.is_reverse);
        let child_ctx = RebuildContext {
            orientation_open: ctx.orientation_open || opens_wrapper,
        };
        let id = row.gml_id.clone();

        let geometry = match class {
            GeometryClass::Polygon => {
                let polygon = self.polygon(row)?;
                return Some(self.wrap_if(wrap, Geometry::Polygon(polygon)));
            }
            GeometryClass::CompositeSurface => {
                let members = self.members(node, child_ctx, GeometryClass::is_surface_member)?;
                let surface = self.counted(Geometry::CompositeSurface(Aggregate { id, members }));
                return Some(self.wrap_if(wrap, surface));
            }
            GeometryClass::TriangulatedSurface => {
                let patches = self.triangles(node, child_ctx)?;
                let surface =
                    self.counted(Geometry::TriangulatedSurface(TriangulatedSurface { id, patches }));
                return Some(self.wrap_if(wrap, surface));
            }
            GeometryClass::MultiSurface => {
                let members = self.members(node, child_ctx, GeometryClass::is_surface_member)?;
                Geometry::MultiSurface(Aggregate { id, members })
            }
            GeometryClass::Solid => {
                let [shell] = node.children.as_mut_slice() else {
                    return None;
                };
                let exterior = self.rebuild_node(shell, child_ctx)?;
                if !matches!(
                    exterior.class(),
                    GeometryClass::CompositeSurface | GeometryClass::OrientableSurface
                ) {
                    return None;
                }
                Geometry::Solid(Solid {
                    id,
                    exterior: exterior.into_property(),
                })
            }
            GeometryClass::CompositeSolid => {
                let members = self.members(node, child_ctx, GeometryClass::is_solid_member)?;
                Geometry::CompositeSolid(Aggregate { id, members })
            }
            GeometryClass::MultiSolid => {
                let members = self.members(node, child_ctx, GeometryClass::is_solid_member)?;
                Geometry::MultiSolid(Aggregate { id, members })
            }
            // Wrappers are created by this function, never stored.
            GeometryClass::OrientableSurface => return None,
        };

        Some(SurfaceGeometryResult::Geometry(self.counted(geometry)))
    }

    fn polygon(&self, row: &GeometryRow) -> Option<Polygon> {
        let payload = row.geometry.as_ref()?;
        let rings = decode_rings(payload, row.is_reverse).ok()?;

        let mut rings = rings.into_iter().enumerate().map(|(i, positions)| LinearRing {
            id: row.gml_id.as_ref().map(|id| format!("{id}_{i}")),
            positions,
        });
        let exterior = rings.next()?;
        let polygon = Polygon {
            id: row.gml_id.clone(),
            exterior,
            interior: rings.collect(),
        };
        self.counters.increment_geometry(GeometryClass::Polygon);
        Some(polygon)
    }

    /// Rebuilds every child and keeps the ones `accept` allows.
    fn members(
        &self,
        node: &mut GeometryNode,
        ctx: RebuildContext,
        accept: fn(&GeometryClass) -> bool,
    ) -> Option<Vec<GeometryProperty>> {
        let members: Vec<GeometryProperty> = node
            .children
            .iter_mut()
            .filter_map(|child| self.rebuild_node(child, ctx))
            .filter(|result| accept(&result.class()))
            .map(SurfaceGeometryResult::into_property)
            .collect();
        (!members.is_empty()).then_some(members)
    }

    fn triangles(&self, node: &mut GeometryNode, ctx: RebuildContext) -> Option<Vec<Triangle>> {
        let patches: Vec<Triangle> = node
            .children
            .iter_mut()
            .filter_map(|child| match self.rebuild_node(child, ctx)? {
                SurfaceGeometryResult::Geometry(Geometry::Polygon(polygon)) => Some(Triangle {
                    exterior: polygon.exterior,
                }),
                _ => None,
            })
            .collect();
        (!patches.is_empty()).then_some(patches)
    }

    fn reference(&self, gml_id: &str, class: GeometryClass, reorient: bool) -> SurfaceGeometryResult {
        let href = format!("#{gml_id}");
        if reorient {
            self.counters.increment_geometry(GeometryClass::OrientableSurface);
            SurfaceGeometryResult::Geometry(Geometry::OrientableSurface(OrientableSurface {
                orientation: Orientation::Negative,
                base_surface: GeometryProperty::Href { href },
            }))
        } else {
            SurfaceGeometryResult::Reference { href, class }
        }
    }

    fn wrap_if(&self, wrap: bool, geometry: Geometry) -> SurfaceGeometryResult {
        if !wrap {
            return SurfaceGeometryResult::Geometry(geometry);
        }
        self.counters.increment_geometry(GeometryClass::OrientableSurface);
        SurfaceGeometryResult::Geometry(Geometry::OrientableSurface(OrientableSurface {
            orientation: Orientation::Negative,
            base_surface: GeometryProperty::Inline(Box::new(geometry)),
        }))
    }

    fn counted(&self, geometry: Geometry) -> Geometry {
        self.counters.increment_geometry(geometry.class());
        geometry
    }
}

/// Identifier of a physical copy of shared geometry; always fresh.
fn copy_id(original: &str, prefix: Option<&str>, append_original: bool) -> String {
    let id = format!("{}{}", prefix.unwrap_or(DEFAULT_COPY_PREFIX), Uuid::new_v4());
    if append_original {
        format!("{id}-{original}")
    } else {
        id
    }
}

/// Reads surface geometry of one root through a row source.
pub struct SurfaceGeometryExporter<'a> {
    source: &'a dyn RowSource,
    rebuilder: Rebuilder<'a>,
    target_srid: Option<u32>,
}

impl<'a> SurfaceGeometryExporter<'a> {
    pub fn new(
        source: &'a dyn RowSource,
        config: &'a ExportConfig,
        lookup: &'a GmlIdLookup,
        counters: &'a Counters,
    ) -> Self {
        Self {
            source,
            rebuilder: Rebuilder::new(config, lookup, counters),
            target_srid: config.target_srid(),
        }
    }

    /// Reads and rebuilds the geometry rooted at `root_id`.
    ///
    /// Returns `Ok(None)` when there are no rows or the root cannot be
    /// rebuilt; the latter is logged. Row-source failures are errors.
    pub fn read(&self, root_id: i64) -> Result<Option<SurfaceGeometryResult>> {
        let rows = self.source.surface_geometry(root_id, self.target_srid)?;
        if rows.is_empty() {
            tracing::debug!(root_id, "no surface geometry rows");
            return Ok(None);
        }
        let row_count = rows.len();

        let Some(mut root) = build_tree(root_id, rows).into_root() else {
            tracing::error!(root_id, rows = row_count, "surface geometry has no root row");
            return Ok(None);
        };

        let result = self.rebuilder.rebuild(&mut root);
        match &result {
            Some(geometry) => {
                tracing::debug!(root_id, rows = row_count, class = %geometry.class(), "rebuilt surface geometry")
            }
            None => tracing::error!(root_id, rows = row_count, "could not rebuild surface geometry"),
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_ids() {
        let fresh = copy_id("g1", None, false);
        assert!(fresh.starts_with(DEFAULT_COPY_PREFIX));
        assert!(!fresh.contains("g1"));
        assert_ne!(fresh, copy_id("g1", None, false));

        let prefixed = copy_id("g1", Some("ID_"), false);
        assert!(prefixed.starts_with("ID_"));
        assert!(!prefixed.ends_with("-g1"));

        let appended = copy_id("g1", None, true);
        assert!(appended.starts_with(DEFAULT_COPY_PREFIX));
        assert!(appended.ends_with("-g1"));
    }

    #[test]
    fn root_row_overrides_stored_parent() {
        let rows = vec![
            GeometryRow::container(5, Some(1), 1).composite(),
            GeometryRow::polygon(6, Some(5), 1, Default::default()),
        ];
        let root = build_tree(5, rows).into_root().unwrap();
        assert_eq!(root.id, 5);
        assert_eq!(root.children.len(), 1);
    }
}
