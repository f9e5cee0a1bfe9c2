//! Fixture documents: loading and variant selection.
//!
//! A fixture is a JSON file standing in for a real backend response. It
//! comes in two shapes. A document with a top-level `code` key *is* the
//! response, returned whole no matter what parameters the request carried:
//!
//! ```json
//! { "code": 0, "data": [1, 2, 3] }
//! ```
//!
//! Any other object is a variant collection keyed by URL-encoded parameter
//! filters, tried in document order against the merged request parameters:
//!
//! ```json
//! {
//!     "page=1&name=a": { "code": 0, "data": [1, 2, 3] },
//!     "page=2&name=b": { "code": 0, "data": [4, 5, 6] }
//! }
//! ```

use crate::error::FixtureError;
use crate::params::ParamFilter;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of parsed fixture documents.
///
/// Given a reference from the route table, returns the parsed JSON document
/// or fails when the fixture is absent or malformed.
#[async_trait]
pub trait FixtureStore: Send + Sync {
    /// Load the document behind `reference`.
    async fn load(&self, reference: &str) -> Result<Value, FixtureError>;
}

/// File-backed fixture store.
///
/// References resolve against the working directory: the process working
/// directory by default, or a directory pinned with [`FsFixtureStore::with_root`]
/// (handy in tests). Root-relative references go through
/// [`normalize_reference`] first. Documents are parsed preserving key order,
/// since variant priority is document order.
#[derive(Debug, Clone, Default)]
pub struct FsFixtureStore {
    root: Option<PathBuf>,
}

impl FsFixtureStore {
    /// Store resolving references against the process working directory.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Store resolving references against a fixed directory instead of the
    /// process working directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve_path(&self, reference: &str) -> std::io::Result<PathBuf> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        Ok(normalize_reference(reference, &root))
    }
}

#[async_trait]
impl FixtureStore for FsFixtureStore {
    async fn load(&self, reference: &str) -> Result<Value, FixtureError> {
        let path = self
            .resolve_path(reference)
            .map_err(|source| FixtureError::Io {
                path: PathBuf::from(reference),
                source,
            })?;
        let content =
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| FixtureError::Io {
                    path: path.clone(),
                    source,
                })?;
        serde_json::from_str(&content).map_err(|source| FixtureError::Parse { path, source })
    }
}

/// Rewrite a fixture reference to the path that is actually read.
///
/// A reference with a leading `/` is made working-directory-relative: the
/// separator is dropped and the remainder appended to the directory string
/// verbatim, with no separator inserted between them. Any other reference
/// joins the directory as given.
pub fn normalize_reference(reference: &str, root: &Path) -> PathBuf {
    match reference.strip_prefix('/') {
        Some(stripped) => {
            let mut joined = root.as_os_str().to_os_string();
            joined.push(stripped);
            PathBuf::from(joined)
        }
        None => root.join(reference),
    }
}

/// Resolve a fixture reference against the merged request parameters.
pub async fn resolve(
    store: &dyn FixtureStore,
    reference: &str,
    merged_params: &HashMap<String, String>,
) -> Result<Value, FixtureError> {
    let document = store.load(reference).await?;
    Ok(select_variant(document, merged_params))
}

/// Pick the response value out of a fixture document.
///
/// A document with a top-level `code` key is returned whole, parameters
/// ignored. Otherwise the document's keys are parameter filters, tried in
/// document order; the first filter contained in `merged_params` selects its
/// value. Nothing matching yields the empty object, an observable "no data
/// for these parameters" answer rather than an error.
pub fn select_variant(document: Value, merged_params: &HashMap<String, String>) -> Value {
    let object = match document {
        Value::Object(object) => object,
        // Only objects carry variants; any other document shape has no keys
        // to try.
        _ => return Value::Object(serde_json::Map::new()),
    };

    if object.contains_key("code") {
        return Value::Object(object);
    }

    for (key, value) in object {
        if ParamFilter::parse(&key).matched_by(merged_params) {
            return value;
        }
    }

    debug!("no fixture variant matched, answering with the empty object");
    Value::Object(serde_json::Map::new())
}
