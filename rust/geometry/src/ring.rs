// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of SDO element-info/ordinate pairs into rings.

use citydb_core::GeometryPayload;
use nalgebra::Point3;
use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Rings of one polygon; the first is the exterior.
pub type Rings = SmallVec<[Vec<Point3<f64>>; 1]>;

/// Splits the ordinate array into rings at the element-info offsets.
///
/// With `reverse` set, every ring's points are emitted last point first.
pub fn decode_rings(payload: &GeometryPayload, reverse: bool) -> Result<Rings> {
    let elem_info = &payload.elem_info;
    let ordinates = &payload.ordinates;

    if elem_info.is_empty() || elem_info.len() % 3 != 0 {
        return Err(Error::InvalidElemInfo(format!(
            "expected offset/etype/interpretation triplets, got {} values",
            elem_info.len()
        )));
    }

    let starts: SmallVec<[usize; 4]> = elem_info
        .chunks_exact(3)
        .map(|triplet| (triplet[0] as usize).wrapping_sub(1))
        .collect();

    let mut rings = Rings::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(ordinates.len());
        if start >= end || end > ordinates.len() {
            return Err(Error::InvalidElemInfo(format!(
                "ring {i} spans ordinates {start}..{end} of {}",
                ordinates.len()
            )));
        }
        let segment = &ordinates[start..end];
        if segment.len() % 3 != 0 {
            return Err(Error::InvalidOrdinates(format!(
                "ring {i} has {} ordinates, not a multiple of 3",
                segment.len()
            )));
        }

        let points = segment.chunks_exact(3).map(|c| Point3::new(c[0], c[1], c[2]));
        let ring = if reverse {
            points.rev().collect()
        } else {
            points.collect()
        };
        rings.push(ring);
    }

    Ok(rings)
}

/// Returns the ring with its point order flipped.
pub fn reverse_ring(points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    points.iter().rev().copied().collect()
}
