// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for row access and shared export services.

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading rows or using shared services.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A row-source query or connection failed.
    #[error("row source error in {table}: {message}")]
    Source { table: &'static str, message: String },

    /// The row source cannot satisfy the request.
    #[error("unsupported request: {0}")]
    Unsupported(String),

    /// A shared lock was poisoned by a panicking worker.
    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// The export configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a row-source error for the given table.
    pub fn source(table: &'static str, message: impl Into<String>) -> Self {
        Error::Source {
            table,
            message: message.into(),
        }
    }
}
