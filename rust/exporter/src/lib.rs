// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # CityDB Exporter
//!
//! Parallel export of buildings and city object groups from a 3D city
//! database into a CityGML feature model.
//!
//! ## Overview
//!
//! - **Exporters**: one per feature type ([`BuildingExporter`],
//!   [`ThematicSurfaceExporter`], [`RoomExporter`], [`AppearanceExporter`],
//!   [`CityObjectGroupExporter`]), each reading its own tables and
//!   delegating geometry to the surface geometry rebuilder
//! - **Manager**: shared lookup, counters and writer ([`ExportManager`])
//! - **Splitter**: one job per top-level object on a rayon pool
//!   ([`Splitter`])
//!
//! ## Quick Start
//!
//! ```rust
//! use citydb_core::{BuildingRow, ExportConfig, ExportFilter, MemorySource};
//! use citydb_exporter::{ExportManager, JsonLinesWriter, Splitter};
//!
//! let mut source = MemorySource::new();
//! source
//!     .add_building(BuildingRow::new(1, None, 1))
//!     .add_building(BuildingRow::new(2, Some(1), 1));
//!
//! let manager = ExportManager::new(ExportConfig::default(), JsonLinesWriter::new(Vec::new()));
//! let summary = Splitter::new(&manager, &source, ExportFilter::default()).run()?;
//! assert_eq!(summary.exported, 1);
//! # Ok::<(), citydb_exporter::Error>(())
//! ```

pub mod appearance;
pub mod building;
pub mod citygml;
pub mod context;
pub mod error;
pub mod group;
pub mod manager;
pub mod room;
pub mod splitter;
pub mod thematic_surface;
pub mod writer;

pub use appearance::AppearanceExporter;
pub use building::{build_hierarchy, BuildingExporter, BuildingNode};
pub use citygml::{
    Appearance, BoundarySurface, BoundarySurfaceKind, Building, BuildingKind, CityObject,
    CityObjectGroup, Envelope, GroupMember, LodGeometry, LodKind, Measure, MeasureList, Opening,
    OpeningKind, ParameterizedTexture, Room, SurfaceData, TextureTarget, X3DMaterial,
};
pub use context::ExportContext;
pub use error::{Error, Result};
pub use group::CityObjectGroupExporter;
pub use manager::ExportManager;
pub use room::RoomExporter;
pub use splitter::{ExportSummary, Splitter};
pub use thematic_surface::ThematicSurfaceExporter;
pub use writer::{FeatureWriter, JsonLinesWriter};
