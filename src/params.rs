//! Parameter merging and URL-encoded parameter filters.
//!
//! Requests carry parameters in two places, the query string and the body;
//! the engine sees one flat map, with body values winning on collision.
//! Route patterns and fixture variant keys carry URL-encoded filter strings
//! (`page=1&test=3`); a filter matches a request when every filter pair is
//! present and equal in the merged map.

use std::collections::HashMap;

/// Merge query and body parameters into one map.
///
/// Right-biased: body values replace query values for overlapping keys.
/// Empty inputs are fine; the result is simply the other map's pairs.
pub fn merge_params(
    query: &HashMap<String, String>,
    body: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut merged = query.clone();
    merged.extend(body.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// A parsed parameter filter: the key/value pairs a request's merged
/// parameters must contain for the filter to match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamFilter {
    required: HashMap<String, String>,
}

impl ParamFilter {
    /// Parse a URL-encoded filter string such as `page=1&test=3`.
    ///
    /// Any string parses: pairs split at the first `=`, a key without a
    /// value gets the empty string, keys and values are percent-decoded.
    pub fn parse(raw: &str) -> Self {
        Self {
            required: parse_query_string(raw),
        }
    }

    /// Containment test: every filter pair is present and equal in `params`.
    ///
    /// Extra keys in `params` are ignored, and the empty filter matches any
    /// parameter map.
    pub fn matched_by(&self, params: &HashMap<String, String>) -> bool {
        self.required.iter().all(|(k, v)| params.get(k) == Some(v))
    }

    /// Number of required pairs.
    pub fn len(&self) -> usize {
        self.required.len()
    }

    /// True when the filter requires nothing.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }
}

/// Parse a query string into key-value pairs.
fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for part in query.split('&') {
        if part.is_empty() {
            continue;
        }
        if let Some((key, value)) = part.split_once('=') {
            params.insert(percent_decode(key), percent_decode(value));
        } else {
            params.insert(percent_decode(part), String::new());
        }
    }

    params
}

/// Simple URL decoding: `%XX` escapes and `+` as space.
///
/// Escapes decode into a byte buffer before the UTF-8 conversion, so
/// multi-byte sequences split across several `%XX` escapes come out as the
/// characters they encode.
fn percent_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if hex.len() == 2 {
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    bytes.push(byte);
                    continue;
                }
            }
            bytes.push(b'%');
            bytes.extend_from_slice(hex.as_bytes());
        } else if ch == '+' {
            bytes.push(b' ');
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}
