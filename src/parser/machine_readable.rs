// Parser for the `--machine-readable` output of the vagrant CLI
//
// Each line is a CSV record: `timestamp,target,type,data...`. The target is
// empty for rows that describe the tool itself rather than a machine.

use std::collections::BTreeMap;

use tracing::debug;

use super::value::{Dict, Value};

/// Rows whose first column does not exceed this are not timestamped output
const MIN_TIMESTAMP: u64 = 10_000;

/// Escape vagrant substitutes for literal commas inside a data column
const COMMA_ESCAPE: &str = "%!(VAGRANT_COMMA)";

/// Machine name -> topic -> ... -> leaf value
pub type StatusTree = BTreeMap<String, Value>;

/// Parse machine-readable output into a tree keyed by machine name.
///
/// Rows without a valid timestamp, rows that cannot be decoded and rows with
/// no key/value pair are skipped. Rows with an empty machine name are dropped
/// from the result.
pub fn parse_machine_readable(output: &str) -> StatusTree {
    let mut parsed = Value::Dict(Dict::new());

    // Lines are decoded one at a time so a stray quote cannot run into the next row
    for (index, line) in output.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let record = match decode_row(line) {
            Some(record) => record,
            None => {
                debug!(row = index, "Skipping undecodable machine-readable row");
                continue;
            }
        };

        let columns: Vec<&str> = record.iter().collect();
        if !has_valid_timestamp(&columns) {
            debug!(row = index, "Skipping machine-readable row without a timestamp");
            continue;
        }

        match nest_path(&columns[1..]) {
            Some(entry) => parsed.deep_merge(entry),
            None => debug!(row = index, "Skipping machine-readable row without data"),
        }
    }

    let mut tree = match parsed {
        Value::Dict(d) => d,
        _ => Dict::new(),
    };

    // Rows not tied to a machine
    tree.remove("");

    tree
}

/// Decode a single line, which must hold exactly one CSV record
fn decode_row(line: &str) -> Option<csv::StringRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    let mut records = reader.records();
    let record = match records.next()? {
        Ok(record) => record,
        Err(e) => {
            debug!(error = %e, "CSV decode failed");
            return None;
        }
    };

    if records.next().is_some() {
        return None;
    }

    Some(record)
}

/// Leading digits of the first column, of any length, must exceed `MIN_TIMESTAMP`
fn has_valid_timestamp(columns: &[&str]) -> bool {
    let Some(first) = columns.first() else {
        return false;
    };

    let first = first.trim_start();
    let end = first
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(first.len());
    let digits = first[..end].trim_start_matches('0');

    match digits.parse::<u64>() {
        Ok(n) => n > MIN_TIMESTAMP,
        // Only overflow remains: too many digits to be small
        Err(_) => !digits.is_empty(),
    }
}

/// Fold `[a, b, c]` into `{a => {b => c}}`
fn nest_path(path: &[&str]) -> Option<Value> {
    let (leaf, keys) = path.split_last()?;
    if keys.is_empty() {
        return None;
    }

    let leaf = Value::String(leaf.replace(COMMA_ESCAPE, ","));
    Some(keys.iter().rev().fold(leaf, |inner, key| {
        let mut d = Dict::new();
        d.insert((*key).to_string(), inner);
        Value::Dict(d)
    }))
}
