// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building export.
//!
//! All building and building part rows of one building root are read with a
//! single query and assembled with [`FlatTree`], the same builder the surface
//! geometry uses. The tree root becomes the [`BuildingKind::Building`]; every
//! other node becomes a nested [`BuildingKind::BuildingPart`].

use citydb_core::parse::{parse_number_list, split_tokens};
use citydb_core::{BuildingRow, FlatTree, SurfaceOwner, TreeNode};

use crate::citygml::{Building, BuildingKind, Envelope, LodKind, Measure, MeasureList};
use crate::context::ExportContext;
use crate::error::Result;
use crate::room::RoomExporter;
use crate::thematic_surface::ThematicSurfaceExporter;

/// Building hierarchy node
pub type BuildingNode = TreeNode<BuildingRow>;

/// Assembles building rows into the building/part hierarchy.
pub fn build_hierarchy(rows: impl IntoIterator<Item = BuildingRow>) -> FlatTree<BuildingRow> {
    let mut tree = FlatTree::new();
    for row in rows {
        let parent = row.parent_id;
        tree.insert(row.id, row, parent);
    }
    tree
}

pub struct BuildingExporter<'c, 'a> {
    ctx: &'c ExportContext<'a>,
}

impl<'c, 'a> BuildingExporter<'c, 'a> {
    pub fn new(ctx: &'c ExportContext<'a>) -> Self {
        Self { ctx }
    }

    /// Reads a building with all its parts.
    ///
    /// Returns `Ok(None)` when the root has no rows or no root row.
    pub fn read(&self, building_root_id: i64) -> Result<Option<Building>> {
        let rows = self.ctx.source.buildings(building_root_id)?;
        if rows.is_empty() {
            tracing::debug!(building_root_id, "no building rows");
            return Ok(None);
        }
        let row_count = rows.len();

        let Some(root) = build_hierarchy(rows).into_root() else {
            tracing::error!(building_root_id, rows = row_count, "building hierarchy has no root row");
            return Ok(None);
        };

        let building = self.rebuild(root, BuildingKind::Building)?;
        if let Some(building) = &building {
            tracing::debug!(building_root_id, parts = building.part_count(), "exported building");
        }
        Ok(building)
    }

    fn rebuild(&self, node: BuildingNode, kind: BuildingKind) -> Result<Option<Building>> {
        let Some(row) = node.payload else {
            tracing::warn!(id = node.id, "building part row never arrived; skipping its subtree");
            return Ok(None);
        };

        let mut parts = Vec::with_capacity(node.children.len());
        let mut building = self.attributes(row, kind)?;
        for child in node.children {
            if let Some(part) = self.rebuild(child, BuildingKind::BuildingPart)? {
                parts.push(part);
            }
        }
        building.parts = parts;
        Ok(Some(building))
    }

    fn attributes(&self, row: BuildingRow, kind: BuildingKind) -> Result<Building> {
        let ctx = self.ctx;

        let mut slots = Vec::with_capacity(8);
        for (i, id) in row.lod_solid_ids.iter().enumerate() {
            slots.push((i as u8 + 1, LodKind::Solid, *id));
        }
        for (i, id) in row.lod_multi_surface_ids.iter().enumerate() {
            slots.push((i as u8 + 1, LodKind::MultiSurface, *id));
        }
        let geometry = ctx.lod_geometries(slots)?;

        let envelope = match &row.envelope {
            Some(envelope) => Some(Envelope::from_row(envelope, ctx.srs_name())),
            None => Envelope::covering(
                geometry.iter().filter_map(|g| g.geometry.geometry()?.bounds()),
                ctx.srs_name(),
            ),
        };

        let boundary_surfaces = ThematicSurfaceExporter::new(ctx).read(SurfaceOwner::Building(row.id))?;
        let rooms = RoomExporter::new(ctx).read(row.id)?;
        let appearances = ctx.appearances(row.id)?;
        ctx.feature_exported(kind.feature_class(), row.gml_id.as_deref(), row.id);

        Ok(Building {
            kind,
            function: split_tokens(row.function.as_deref()),
            usage: split_tokens(row.usage.as_deref()),
            measured_height: row.measured_height.map(|value| Measure {
                value,
                uom: row.measured_height_unit.clone(),
            }),
            storey_heights_above_ground: measure_list(
                row.storey_heights_above_ground.as_deref(),
                row.storey_heights_above_ground_unit,
            ),
            storey_heights_below_ground: measure_list(
                row.storey_heights_below_ground.as_deref(),
                row.storey_heights_below_ground_unit,
            ),
            gml_id: row.gml_id,
            name: row.name,
            description: row.description,
            class: row.class,
            year_of_construction: row.year_of_construction,
            year_of_demolition: row.year_of_demolition,
            roof_type: row.roof_type,
            storeys_above_ground: row.storeys_above_ground,
            storeys_below_ground: row.storeys_below_ground,
            envelope,
            geometry,
            boundary_surfaces,
            rooms,
            appearances,
            parts: Vec::new(),
        })
    }
}

fn measure_list(values: Option<&str>, uom: Option<String>) -> Option<MeasureList> {
    let values = parse_number_list(values);
    (!values.is_empty()).then_some(MeasureList { values, uom })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use citydb_core::{Counters, EnvelopeRow, ExportConfig, FeatureClass, GmlIdKind, GmlIdLookup, MemorySource};

    fn export(source: &MemorySource, config: &ExportConfig, lookup: &GmlIdLookup) -> Option<Building> {
        let counters = Counters::new();
        let ctx = ExportContext::new(source, config, lookup, &counters);
        BuildingExporter::new(&ctx).read(1).unwrap()
    }

    #[test]
    fn measures_and_code_lists_are_parsed() {
        let mut source = MemorySource::new();
        source.add_building(BuildingRow {
            gml_id: Some("bldg_1".into()),
            function: Some("1000\t1010".into()),
            measured_height: Some(12.5),
            measured_height_unit: Some("m".into()),
            storey_heights_above_ground: Some("3.0 2.75 x 2.75".into()),
            storey_heights_above_ground_unit: Some("m".into()),
            storey_heights_below_ground: Some("   ".into()),
            envelope: Some(EnvelopeRow {
                lower: [0.0, 0.0, 0.0],
                upper: [10.0, 10.0, 12.5],
            }),
            ..BuildingRow::new(1, None, 1)
        });

        let building = export(&source, &ExportConfig::default(), &GmlIdLookup::new()).unwrap();
        assert_eq!(building.kind, BuildingKind::Building);
        assert_eq!(building.function, vec!["1000", "1010"]);
        let height = building.measured_height.unwrap();
        assert_relative_eq!(height.value, 12.5);
        assert_eq!(height.uom.as_deref(), Some("m"));
        assert_eq!(building.storey_heights_above_ground.unwrap().values, vec![3.0, 2.75, 2.75]);
        assert!(building.storey_heights_below_ground.is_none());
        assert_relative_eq!(building.envelope.unwrap().upper_corner.z, 12.5);
    }

    #[test]
    fn parts_nest_under_their_parents() {
        let mut source = MemorySource::new();
        // children before parents
        source
            .add_building(BuildingRow::new(3, Some(2), 1))
            .add_building(BuildingRow::new(2, Some(1), 1))
            .add_building(BuildingRow::new(1, Some(0), 1))
            .add_building(BuildingRow::new(4, Some(1), 1));

        let building = export(&source, &ExportConfig::default(), &GmlIdLookup::new()).unwrap();
        assert_eq!(building.part_count(), 4);
        assert_eq!(building.parts.len(), 2);
        assert!(building.parts.iter().all(|p| p.kind == BuildingKind::BuildingPart));
        assert_eq!(building.parts[0].parts.len(), 1);
    }

    #[test]
    fn features_register_only_for_group_export() {
        let mut source = MemorySource::new();
        source
            .add_building(BuildingRow::new(1, None, 1))
            .add_building(BuildingRow {
                gml_id: Some("part_2".into()),
                ..BuildingRow::new(2, Some(1), 1)
            })
            .add_building(BuildingRow {
                gml_id: Some("other_root".into()),
                ..BuildingRow::new(9, None, 9)
            });

        let lookup = GmlIdLookup::new();
        export(&source, &ExportConfig::default(), &lookup);
        assert!(lookup.is_empty());

        let config = ExportConfig {
            export_groups: true,
            ..ExportConfig::default()
        };
        export(&source, &config, &lookup);
        assert_eq!(lookup.get(2, GmlIdKind::Feature).as_deref(), Some("part_2"));
        assert!(!lookup.contains("other_root"));
    }

    #[test]
    fn nested_parts_are_counted() {
        let mut source = MemorySource::new();
        source
            .add_building(BuildingRow::new(1, None, 1))
            .add_building(BuildingRow::new(2, Some(1), 1));

        let config = ExportConfig::default();
        let lookup = GmlIdLookup::new();
        let counters = Counters::new();
        let ctx = ExportContext::new(&source, &config, &lookup, &counters);
        BuildingExporter::new(&ctx).read(1).unwrap();

        assert_eq!(counters.feature_count(FeatureClass::BuildingPart), 1);
        // top-level features are counted when printed
        assert_eq!(counters.feature_count(FeatureClass::Building), 0);
    }

    #[test]
    fn unknown_root_yields_nothing() {
        let source = MemorySource::new();
        assert!(export(&source, &ExportConfig::default(), &GmlIdLookup::new()).is_none());
    }
}
