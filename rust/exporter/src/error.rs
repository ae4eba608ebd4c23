// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use citydb_core::FeatureClass;
use thiserror::Error;

/// Result type for export jobs
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a single export job or the whole run
#[derive(Error, Debug)]
pub enum Error {
    #[error("Core error: {0}")]
    Core(#[from] citydb_core::Error),

    #[error("Geometry error: {0}")]
    Geometry(#[from] citydb_geometry::Error),

    #[error("{class} {id} cannot be exported as a top-level feature")]
    NotTopLevel { class: FeatureClass, id: i64 },

    #[error("Feature writer failed: {0}")]
    Write(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
