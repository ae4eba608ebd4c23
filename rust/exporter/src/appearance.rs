// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Appearance export.
//!
//! Appearance rows arrive flattened: one row per (appearance, surface data,
//! target) triple. They are regrouped in row order, and every target geometry
//! id is resolved through the gml:id lookup. Targets whose geometry was not
//! written with an identifier cannot be referenced and are dropped.

use citydb_core::parse::parse_number_list;
use citydb_core::{AppearanceRow, FeatureClass, GmlIdKind};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::citygml::{Appearance, ParameterizedTexture, SurfaceData, TextureTarget, X3DMaterial};
use crate::context::ExportContext;
use crate::error::Result;

pub struct AppearanceExporter<'c, 'a> {
    ctx: &'c ExportContext<'a>,
}

impl<'c, 'a> AppearanceExporter<'c, 'a> {
    pub fn new(ctx: &'c ExportContext<'a>) -> Self {
        Self { ctx }
    }

    /// Reads the appearances of one city object.
    ///
    /// Must run after the object's geometry has been rebuilt, since that is
    /// when target geometry identifiers are registered.
    pub fn read(&self, cityobject_id: i64) -> Result<Vec<Appearance>> {
        let rows = self.ctx.source.appearances(cityobject_id)?;

        let mut appearances: Vec<Appearance> = Vec::new();
        let mut by_appearance: FxHashMap<i64, usize> = FxHashMap::default();
        let mut by_surface_data: FxHashMap<(i64, i64), usize> = FxHashMap::default();
        let mut unsupported: FxHashSet<i64> = FxHashSet::default();

        for row in &rows {
            let appearance = *by_appearance.entry(row.appearance_id).or_insert_with(|| {
                appearances.push(Appearance {
                    gml_id: row.appearance_gml_id.clone(),
                    theme: row.theme.clone(),
                    surface_data: Vec::new(),
                });
                appearances.len() - 1
            });

            let Some(surface_data_id) = row.surface_data_id else {
                continue;
            };
            if unsupported.contains(&surface_data_id) {
                continue;
            }

            let key = (row.appearance_id, surface_data_id);
            let index = match by_surface_data.get(&key) {
                Some(&index) => index,
                None => match surface_data(row) {
                    Some(data) => {
                        let list = &mut appearances[appearance].surface_data;
                        list.push(data);
                        by_surface_data.insert(key, list.len() - 1);
                        list.len() - 1
                    }
                    None => {
                        tracing::error!(
                            surface_data_id,
                            kind = row.surface_data_type.as_deref().unwrap_or("<none>"),
                            "unsupported surface data type"
                        );
                        unsupported.insert(surface_data_id);
                        continue;
                    }
                },
            };

            self.add_target(&mut appearances[appearance].surface_data[index], row);
        }

        appearances.iter_mut().for_each(|appearance| {
            appearance.surface_data.retain(|data| data.target_count() > 0)
        });
        appearances.retain(|appearance| !appearance.surface_data.is_empty());

        self.ctx
            .counters
            .add_features(FeatureClass::Appearance, appearances.len() as u64);
        tracing::debug!(cityobject_id, rows = rows.len(), appearances = appearances.len(), "exported appearances");
        Ok(appearances)
    }

    fn add_target(&self, data: &mut SurfaceData, row: &AppearanceRow) {
        let Some(geometry_id) = row.target_geometry_id else {
            return;
        };
        let Some(target) = self.ctx.lookup.get(geometry_id, GmlIdKind::Geometry) else {
            tracing::debug!(geometry_id, "appearance target has no exported gml:id");
            return;
        };

        match data {
            SurfaceData::X3DMaterial(material) => material.targets.push(format!("#{target}")),
            SurfaceData::ParameterizedTexture(texture) => {
                let coordinates = parse_number_list(row.texture_coordinates.as_deref());
                if coordinates.len() % 2 != 0 {
                    tracing::warn!(geometry_id, count = coordinates.len(), "odd number of texture coordinates");
                }
                texture.targets.push(TextureTarget {
                    uri: format!("#{target}"),
                    ring: format!("#{target}_0"),
                    coordinates,
                });
            }
        }
    }
}

fn surface_data(row: &AppearanceRow) -> Option<SurfaceData> {
    match row.surface_data_type.as_deref()? {
        "X3DMaterial" => Some(SurfaceData::X3DMaterial(X3DMaterial {
            gml_id: row.surface_data_gml_id.clone(),
            is_front: row.is_front,
            diffuse_color: row.diffuse_color,
            transparency: row.transparency,
            shininess: row.shininess,
            ambient_intensity: row.ambient_intensity,
            targets: Vec::new(),
        })),
        "ParameterizedTexture" => Some(SurfaceData::ParameterizedTexture(ParameterizedTexture {
            gml_id: row.surface_data_gml_id.clone(),
            is_front: row.is_front,
            image_uri: row.image_uri.clone(),
            mime_type: row.mime_type.clone(),
            targets: Vec::new(),
        })),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citydb_core::{Counters, ExportConfig, GmlIdLookup, MemorySource};

    fn row(appearance_id: i64, surface_data_id: i64, kind: &str, target: i64) -> AppearanceRow {
        AppearanceRow {
            appearance_id,
            cityobject_id: 1,
            appearance_gml_id: Some(format!("app_{appearance_id}")),
            theme: Some("rgbTexture".into()),
            surface_data_id: Some(surface_data_id),
            surface_data_gml_id: Some(format!("sd_{surface_data_id}")),
            surface_data_type: Some(kind.into()),
            target_geometry_id: Some(target),
            texture_coordinates: Some("0 0 1 0 1 1 0 0".into()),
            ..AppearanceRow::default()
        }
    }

    fn export(source: &MemorySource, lookup: &GmlIdLookup) -> (Vec<Appearance>, u64) {
        let config = ExportConfig::default();
        let counters = Counters::new();
        let ctx = ExportContext::new(source, &config, lookup, &counters);
        let appearances = AppearanceExporter::new(&ctx).read(1).unwrap();
        (appearances, counters.feature_count(FeatureClass::Appearance))
    }

    #[test]
    fn rows_are_grouped_and_targets_resolved() {
        let lookup = GmlIdLookup::new();
        lookup.put("poly_10", 10, GmlIdKind::Geometry);
        lookup.put("poly_11", 11, GmlIdKind::Geometry);

        let mut source = MemorySource::new();
        source
            .add_appearance(row(1, 100, "ParameterizedTexture", 10))
            .add_appearance(row(1, 100, "ParameterizedTexture", 11))
            .add_appearance(row(1, 101, "X3DMaterial", 10))
            .add_appearance(row(1, 101, "X3DMaterial", 99));

        let (appearances, counted) = export(&source, &lookup);
        assert_eq!(appearances.len(), 1);
        assert_eq!(counted, 1);

        let data = &appearances[0].surface_data;
        assert_eq!(data.len(), 2);
        let SurfaceData::ParameterizedTexture(texture) = &data[0] else {
            panic!("expected texture first");
        };
        assert_eq!(texture.targets.len(), 2);
        assert_eq!(texture.targets[1].uri, "#poly_11");
        assert_eq!(texture.targets[1].ring, "#poly_11_0");
        assert_eq!(texture.targets[0].coordinates.len(), 8);

        // target 99 was never registered
        let SurfaceData::X3DMaterial(material) = &data[1] else {
            panic!("expected material second");
        };
        assert_eq!(material.targets, vec!["#poly_10".to_string()]);
    }

    #[test]
    fn unsupported_surface_data_is_skipped() {
        let lookup = GmlIdLookup::new();
        lookup.put("poly_10", 10, GmlIdKind::Geometry);

        let mut source = MemorySource::new();
        source
            .add_appearance(row(1, 100, "GeoreferencedTexture", 10))
            .add_appearance(row(1, 101, "X3DMaterial", 10));

        let (appearances, _) = export(&source, &lookup);
        assert_eq!(appearances[0].surface_data.len(), 1);
        assert_eq!(appearances[0].surface_data[0].gml_id(), Some("sd_101"));
    }

    #[test]
    fn appearance_without_resolvable_targets_is_dropped() {
        let lookup = GmlIdLookup::new();
        let mut source = MemorySource::new();
        source.add_appearance(row(1, 100, "X3DMaterial", 10));

        let (appearances, counted) = export(&source, &lookup);
        assert!(appearances.is_empty());
        assert_eq!(counted, 0);
    }
}
