//! Typed errors for the resolution engine.
//!
//! Two situations are deliberately *not* errors and never appear here: an
//! unmatched request (reported as a pass-through outcome so the host keeps
//! handling it) and a fixture document with no matching variant (answered
//! with the empty-object sentinel). Errors are reserved for broken inputs,
//! meaning an unreadable or malformed route table or fixture file, and for
//! forwarding failures, which are carried through untouched.

use std::path::PathBuf;
use thiserror::Error;

/// Failure loading the route table file.
#[derive(Debug, Error)]
pub enum TableError {
    /// The table file could not be read.
    #[error("route table {} could not be read", path.display())]
    Io {
        /// Path the load attempted.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The table file is not valid JSON.
    #[error("route table {} is not valid JSON", path.display())]
    Parse {
        /// Path the load attempted.
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The table parsed, but is not an object of pattern → destination
    /// strings.
    #[error("route table {} is malformed: {detail}", path.display())]
    Shape {
        /// Path the load attempted.
        path: PathBuf,
        /// What exactly was wrong with the document shape.
        detail: String,
    },
}

/// Failure loading a fixture document.
///
/// A matched fixture that cannot be loaded is a hard failure of the
/// resolution: there is no sensible content to answer with, so the host
/// framework's generic error handling takes over.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The fixture file could not be read.
    #[error("fixture {} could not be read", path.display())]
    Io {
        /// Path the load attempted (after reference normalization).
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The fixture file is not valid JSON.
    #[error("fixture {} is not valid JSON", path.display())]
    Parse {
        /// Path the load attempted (after reference normalization).
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level failure of a single resolution attempt.
#[derive(Debug, Error)]
pub enum MockError {
    /// The route table could not be loaded for this request.
    #[error(transparent)]
    Table(#[from] TableError),

    /// The matched fixture could not be loaded.
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    /// The forwarding transport failed. The error is the transport's own,
    /// passed through verbatim; the engine neither interprets nor retries.
    #[error(transparent)]
    Forward(#[from] anyhow::Error),
}
