// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry type classification of surface geometry nodes.
//!
//! | inline coordinates | children | triangulated | solid | composite | class |
//! |---|---|---|---|---|---|
//! | yes | - | - | - | - | Polygon |
//! | no | none | - | - | - | unclassifiable |
//! | no | some | yes | - | - | TriangulatedSurface |
//! | no | some | no | no | yes | CompositeSurface |
//! | no | some | no | yes | no | Solid |
//! | no | some | no | yes | yes | CompositeSolid |
//! | no | some | no | no | no | MultiSolid if every child is a solid, else MultiSurface |

use citydb_core::{GeometryClass, GeometryRow, TreeNode};

/// Surface geometry tree node.
pub type GeometryNode = TreeNode<GeometryRow>;

/// Classifies a node; `None` for pseudo-nodes and childless containers.
pub fn classify(node: &GeometryNode) -> Option<GeometryClass> {
    let row = node.payload.as_ref()?;

    if row.geometry.is_some() {
        return Some(GeometryClass::Polygon);
    }
    if node.children.is_empty() {
        return None;
    }
    if row.is_triangulated {
        return Some(GeometryClass::TriangulatedSurface);
    }

    Some(match (row.is_solid, row.is_composite) {
        (false, true) => GeometryClass::CompositeSurface,
        (true, false) => GeometryClass::Solid,
        (true, true) => GeometryClass::CompositeSolid,
        (false, false) => {
            let all_solid = node
                .children
                .iter()
                .all(|child| child.payload.as_ref().is_some_and(|c| c.is_solid));
            if all_solid {
                GeometryClass::MultiSolid
            } else {
                GeometryClass::MultiSurface
            }
        }
    })
}
