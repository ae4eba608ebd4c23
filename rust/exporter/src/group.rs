// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! City object group export.

use citydb_core::parse::split_tokens;
use citydb_core::{FeatureClass, GmlIdKind};

use crate::citygml::{CityObjectGroup, Envelope, GroupMember};
use crate::context::ExportContext;
use crate::error::Result;

pub struct CityObjectGroupExporter<'c, 'a> {
    ctx: &'c ExportContext<'a>,
}

impl<'c, 'a> CityObjectGroupExporter<'c, 'a> {
    pub fn new(ctx: &'c ExportContext<'a>) -> Self {
        Self { ctx }
    }

    /// Reads one group with its member references.
    ///
    /// With `group_members_exported_only`, members whose feature was not
    /// registered by this run are left out, so groups have to be exported
    /// after every other feature.
    pub fn read(&self, group_id: i64) -> Result<Option<CityObjectGroup>> {
        let ctx = self.ctx;
        let Some(row) = ctx.source.city_object_group(group_id)? else {
            tracing::debug!(group_id, "no city object group row");
            return Ok(None);
        };

        let members_only_exported = ctx.config.group_members_exported_only;
        let mut members = Vec::new();
        for member in ctx.source.group_members(group_id)? {
            if members_only_exported && ctx.lookup.get(member.member_id, GmlIdKind::Feature).is_none() {
                tracing::debug!(group_id, member = %member.member_gml_id, "group member was not exported");
                continue;
            }
            members.push(GroupMember {
                href: format!("#{}", member.member_gml_id),
                role: member.role,
            });
        }

        let geometry = match row.brep_id {
            Some(brep_id) => ctx.geometry(brep_id)?,
            None => None,
        };
        let envelope = match &row.envelope {
            Some(envelope) => Some(Envelope::from_row(envelope, ctx.srs_name())),
            None => Envelope::covering(
                geometry.as_ref().and_then(|g| g.geometry()?.bounds()),
                ctx.srs_name(),
            ),
        };
        let appearances = ctx.appearances(group_id)?;
        ctx.feature_exported(FeatureClass::CityObjectGroup, row.gml_id.as_deref(), group_id);

        tracing::debug!(group_id, members = members.len(), "exported city object group");
        Ok(Some(CityObjectGroup {
            function: split_tokens(row.function.as_deref()),
            usage: split_tokens(row.usage.as_deref()),
            parent: row.parent_gml_id.map(|id| format!("#{id}")),
            gml_id: row.gml_id,
            name: row.name,
            description: row.description,
            class: row.class,
            envelope,
            geometry,
            members,
            appearances,
        }))
    }
}
