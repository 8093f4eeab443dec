//! Case identifiers: `RSQ-` followed by a zero-padded counter.

use crate::error::{ResqError, Result};
use crate::store::Table;
use regex::Regex;
use std::sync::OnceLock;

pub const CASE_ID_PREFIX: &str = "RSQ";
pub const FIRST_CASE_ID: &str = "RSQ-00001";

fn case_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^RSQ-(\d+)$").expect("valid case id regex"))
}

pub fn format_case_id(n: u64) -> String {
    format!("{CASE_ID_PREFIX}-{n:05}")
}

/// Numeric suffix of a well-formed case id.
pub fn parse_case_id(id: &str) -> Option<u64> {
    case_id_pattern()
        .captures(id.trim())
        .and_then(|caps| caps[1].parse().ok())
}

/// Next id for a `cases` table.
pub fn next_case_id(table: &Table) -> Result<String> {
    let ids: Vec<&str> = table.column("case_id").collect();
    next_case_id_from(&ids)
}

/// Next id after `ids`, given in insertion order.
///
/// The last id is normally the highest, so it is incremented directly. If it
/// does not parse, the result is one past both the highest well-formed
/// suffix and the row count, which never collides with an existing id.
/// A counter that cannot be incremented is malformed storage.
pub fn next_case_id_from<S: AsRef<str>>(ids: &[S]) -> Result<String> {
    let Some(last) = ids.last() else {
        return Ok(FIRST_CASE_ID.to_string());
    };

    if let Some(n) = parse_case_id(last.as_ref()) {
        return increment(n);
    }

    let highest = ids
        .iter()
        .filter_map(|id| parse_case_id(id.as_ref()))
        .max()
        .unwrap_or(0);
    let next = increment(highest.max(ids.len() as u64))?;
    log::warn!(
        "Last case id {:?} is malformed; continuing from {next}",
        last.as_ref()
    );
    Ok(next)
}

fn increment(n: u64) -> Result<String> {
    n.checked_add(1).map(format_case_id).ok_or_else(|| {
        ResqError::malformed(
            "cases",
            format!("case id counter exhausted at {}", format_case_id(n)),
        )
    })
}
