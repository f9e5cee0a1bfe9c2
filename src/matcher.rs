//! Route matching: the first table entry accepting the request wins.

use crate::table::{RouteEntry, RouteTable};
use std::collections::HashMap;

/// Find the first table entry matching the request.
///
/// An entry matches when its pattern path is a string prefix of
/// `request_path` and its parameter filter, when it has one, is contained in
/// `merged_params`. An entry without a filter is the no-parameter fallback:
/// it matches on the prefix alone, whatever parameters the request carries.
///
/// The prefix test is a raw string comparison, not a segment-aware path
/// match: a registered `/api/test` also accepts a requested `/api/test1`.
/// That lets one base pattern cover several sub-resources, and it is part of
/// the matching contract even where the overlap is surprising.
///
/// Entries are tried in table order and the first match is returned; `None`
/// means no entry matched and the caller must pass the request through
/// unmodified.
pub fn match_route<'a>(
    request_path: &str,
    table: &'a RouteTable,
    merged_params: &HashMap<String, String>,
) -> Option<&'a RouteEntry> {
    table.entries().iter().find(|entry| {
        let pattern = entry.pattern();
        if !request_path.starts_with(pattern.path()) {
            return false;
        }
        match pattern.filter() {
            None => true,
            Some(filter) => filter.matched_by(merged_params),
        }
    })
}
