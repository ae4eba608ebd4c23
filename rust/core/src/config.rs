// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Export configuration, read once at job start.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How geometry that is referenced from more than one place is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum XlinkMode {
    /// Write the geometry once and refer to it with `xlink:href` afterwards.
    Reference,
    /// Write a physical copy every time it is referenced.
    Copy {
        /// Prefix for regenerated identifiers of copies; `UUID_` when unset.
        #[serde(default)]
        id_prefix: Option<String>,
        /// Append the original identifier to regenerated ones.
        #[serde(default)]
        append_original_id: bool,
    },
}

impl Default for XlinkMode {
    fn default() -> Self {
        XlinkMode::Reference
    }
}

/// Spatial reference system geometries are exported in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSrs {
    pub srid: u32,
    pub srs_name: String,
}

/// Export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub xlink: XlinkMode,
    /// Export appearances; geometry ids are then registered as texture targets.
    pub export_appearance: bool,
    /// Export city object groups; feature ids are then registered for member lookups.
    pub export_groups: bool,
    /// Only reference group members that were exported in the same run.
    pub group_members_exported_only: bool,
    /// Coordinate transformation target; `None` keeps the database SRS.
    pub target_srs: Option<TargetSrs>,
    /// Number of worker threads for the export pool.
    pub worker_threads: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            xlink: XlinkMode::Reference,
            export_appearance: true,
            export_groups: false,
            group_members_exported_only: false,
            target_srs: None,
            worker_threads: num_cpus::get(),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl ExportConfig {
    /// Load configuration from `CITYDB_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let xlink = match std::env::var("CITYDB_XLINK_MODE")
            .unwrap_or_else(|_| "reference".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "reference" => XlinkMode::Reference,
            "copy" => XlinkMode::Copy {
                id_prefix: std::env::var("CITYDB_XLINK_ID_PREFIX").ok(),
                append_original_id: env_flag("CITYDB_XLINK_APPEND_ID", false),
            },
            other => {
                return Err(Error::Config(format!(
                    "CITYDB_XLINK_MODE must be 'reference' or 'copy', got '{other}'"
                )))
            }
        };

        let target_srs = match std::env::var("CITYDB_TARGET_SRID") {
            Ok(srid) => {
                let srid: u32 = srid
                    .parse()
                    .map_err(|_| Error::Config(format!("invalid CITYDB_TARGET_SRID '{srid}'")))?;
                let srs_name = std::env::var("CITYDB_TARGET_SRS_NAME")
                    .unwrap_or_else(|_| format!("EPSG:{srid}"));
                Some(TargetSrs { srid, srs_name })
            }
            Err(_) => None,
        };

        let config = Self {
            xlink,
            export_appearance: env_flag("CITYDB_EXPORT_APPEARANCE", defaults.export_appearance),
            export_groups: env_flag("CITYDB_EXPORT_GROUPS", defaults.export_groups),
            group_members_exported_only: env_flag(
                "CITYDB_GROUP_MEMBERS_EXPORTED_ONLY",
                defaults.group_members_exported_only,
            ),
            target_srs,
            worker_threads: std::env::var("CITYDB_WORKER_THREADS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.worker_threads),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON configuration document; missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(Error::Config("worker_threads must be at least 1".into()));
        }
        if self.group_members_exported_only && !self.export_groups {
            return Err(Error::Config(
                "group_members_exported_only requires export_groups".into(),
            ));
        }
        Ok(())
    }

    /// Target SRID passed to geometry queries.
    pub fn target_srid(&self) -> Option<u32> {
        self.target_srs.as_ref().map(|srs| srs.srid)
    }

    /// Whether exported features register their gml:id for group member lookups.
    pub fn registers_feature_ids(&self) -> bool {
        self.export_groups
    }
}
