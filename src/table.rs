//! The routing table: an ordered pattern → destination mapping.
//!
//! The table lives in a JSON file and is re-read on every resolution, so
//! edits take effect on the very next request without restarting the host
//! process. Document order is match priority: the first matching entry wins.
//!
//! ```json
//! {
//!     "/api/test1": "mock/test1.json",
//!     "/api/test3": "http://localhost:3004/api/test4",
//!     "/api/test4?page=1": "mock/test4-1.json",
//!     "/api/test4?page=2": "mock/test4-2.json"
//! }
//! ```

use crate::error::TableError;
use crate::params::ParamFilter;
use std::fmt;
use std::path::Path;

/// A route pattern: a path, optionally followed by a `?key=value&...`
/// parameter filter.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    path: String,
    filter: Option<ParamFilter>,
}

impl RoutePattern {
    /// Parse a pattern string. Everything before the first `?` is the path
    /// component; the remainder, when present, is a parameter filter.
    /// Parsing never fails, since any string is a valid pattern.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('?') {
            Some((path, query)) => Self {
                raw: raw.to_string(),
                path: path.to_string(),
                filter: Some(ParamFilter::parse(query)),
            },
            None => Self {
                raw: raw.to_string(),
                path: raw.to_string(),
                filter: None,
            },
        }
    }

    /// The path component (always present).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The parameter filter, when the pattern carries one.
    pub fn filter(&self) -> Option<&ParamFilter> {
        self.filter.as_ref()
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One table entry: a route pattern and the destination it maps to.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pattern: RoutePattern,
    destination: String,
}

impl RouteEntry {
    /// The pattern half of the entry.
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// The destination string: either a remote address plus sub-path, or a
    /// fixture file reference.
    pub fn destination(&self) -> &str {
        &self.destination
    }
}

/// The ordered routing table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Load the table from a JSON file.
    ///
    /// Always goes to disk. There is deliberately no caching, so callers
    /// re-loading per request observe file edits immediately.
    pub async fn from_file(path: &Path) -> Result<Self, TableError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| TableError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
        Self::parse_json(&content, path)
    }

    /// Parse a table from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        Self::parse_json(json, Path::new("<inline>"))
    }

    fn parse_json(json: &str, origin: &Path) -> Result<Self, TableError> {
        let document: serde_json::Value =
            serde_json::from_str(json).map_err(|source| TableError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;

        let object = document.as_object().ok_or_else(|| TableError::Shape {
            path: origin.to_path_buf(),
            detail: "top level is not an object".to_string(),
        })?;

        let mut entries = Vec::with_capacity(object.len());
        for (pattern, destination) in object {
            let destination = destination.as_str().ok_or_else(|| TableError::Shape {
                path: origin.to_path_buf(),
                detail: format!("value for {pattern:?} is not a string"),
            })?;
            entries.push(RouteEntry {
                pattern: RoutePattern::parse(pattern),
                destination: destination.to_string(),
            });
        }

        Ok(Self { entries })
    }

    /// Entries in document order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
