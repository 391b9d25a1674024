//! Structured output parsing
//!
//! Tools like `docker ps --format json` print one JSON document per line.
//! Lines that do not parse are skipped.

use serde::de::DeserializeOwned;
use tracing::debug;

/// Parse newline-delimited JSON records, keeping the ones that parse in order
pub fn parse_records<T: DeserializeOwned>(output: &str) -> Vec<T> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<T>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, line = %line, "Skipping unparseable output line");
                None
            }
        })
        .collect()
}
