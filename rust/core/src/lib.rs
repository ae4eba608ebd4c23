// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # CityDB Core
//!
//! Row model and shared services for exporting a 3D city database.
//!
//! ## Overview
//!
//! - **Rows**: typed rows of the geometry, building, surface, appearance and
//!   group tables ([`row`]), read through the [`RowSource`] trait
//! - **Flat tree**: one-pass assembly of self-referencing tables into trees,
//!   tolerant of children arriving before their parents ([`tree`])
//! - **gml:id lookup**: the concurrent first-claim registry export jobs use
//!   to decide who writes a shared object ([`lookup`])
//! - **Configuration** and **diagnostic counters** shared by all jobs
//!
//! ## Quick Start
//!
//! ```rust
//! use citydb_core::{FlatTree, GeometryPayload, GeometryRow};
//!
//! let square = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
//! let rows = vec![
//!     GeometryRow::polygon(2, Some(1), 1, GeometryPayload::single_ring(&square)),
//!     GeometryRow::container(1, None, 1).composite(),
//! ];
//!
//! let mut tree = FlatTree::new();
//! for row in rows {
//!     let parent = row.parent_id;
//!     tree.insert(row.id, row, parent);
//! }
//! assert_eq!(tree.into_root().unwrap().children.len(), 1);
//! ```

pub mod class;
pub mod config;
pub mod counter;
pub mod error;
pub mod lookup;
pub mod memory;
pub mod parse;
pub mod row;
pub mod source;
pub mod tree;

pub use class::{FeatureClass, GeometryClass};
pub use config::{ExportConfig, TargetSrs, XlinkMode};
pub use counter::{CounterSnapshot, Counters};
pub use error::{Error, Result};
pub use lookup::{GmlIdKind, GmlIdLookup};
pub use memory::MemorySource;
pub use row::{
    AppearanceRow, BuildingRow, CityObjectGroupRow, EnvelopeRow, GeometryPayload, GeometryRow,
    GroupMemberRow, OpeningRow, RoomRow, RootObject, SurfaceOwner, ThematicSurfaceRow,
};
pub use source::{ConnectionProvider, ExportFilter, RowSource};
pub use tree::{FlatTree, NodeKey, TreeNode, TreePayload};
