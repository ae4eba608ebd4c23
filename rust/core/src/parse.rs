// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsing of whitespace-delimited list columns.

/// Splits a code list column into its tokens.
pub fn split_tokens(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| v.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Parses a number list column; tokens that are not numbers are skipped.
pub fn parse_number_list(value: Option<&str>) -> Vec<f64> {
    let Some(value) = value else {
        return Vec::new();
    };
    value
        .split_whitespace()
        .filter_map(|token| match fast_float::parse::<f64, _>(token) {
            Ok(number) => Some(number),
            Err(_) => {
                tracing::warn!(token, "skipping non-numeric list entry");
                None
            }
        })
        .collect()
}
