// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Feature writers.

use std::io::{BufWriter, Write};

use crate::citygml::CityObject;
use crate::error::{Error, Result};

/// Sink for finished top-level features.
pub trait FeatureWriter: Send {
    fn write(&mut self, feature: &CityObject) -> Result<()>;

    /// Flushes buffered output at the end of a run.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects features in memory.
impl FeatureWriter for Vec<CityObject> {
    fn write(&mut self, feature: &CityObject) -> Result<()> {
        self.push(feature.clone());
        Ok(())
    }
}

/// Writes one JSON document per feature and line.
pub struct JsonLinesWriter<W: Write> {
    out: BufWriter<W>,
    written: usize,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: BufWriter::new(out),
            written: 0,
        }
    }

    /// Number of features written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.out
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

impl<W: Write + Send> FeatureWriter for JsonLinesWriter<W> {
    fn write(&mut self, feature: &CityObject) -> Result<()> {
        serde_json::to_writer(&mut self.out, feature)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out
            .flush()
            .map_err(|e| Error::Write(format!("flush after {} features: {e}", self.written)))
    }
}
