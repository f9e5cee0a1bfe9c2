//! Destination classification: remote delegate or local fixture.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading `scheme://host[:port]` token of a remote destination.
static REMOTE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[\w.:-]*").expect("remote token pattern"));

/// A classified destination string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Delegate the request to a remote backend.
    Remote {
        /// The `scheme://host[:port]` token.
        base_address: String,
        /// Remainder of the destination after the token; the request path is
        /// rewritten to this on the remote.
        sub_path: String,
    },
    /// Answer the request from a local fixture document.
    Fixture {
        /// Fixture file reference, working-directory-relative or
        /// root-relative.
        reference: String,
    },
}

/// Classify a destination string.
///
/// Purely syntactic: a destination starting with an `http://` or `https://`
/// token is remote, everything else is a fixture reference. There is no
/// error case; a nonsensical reference only fails later, when the fixture
/// load is attempted.
pub fn classify(destination: &str) -> Destination {
    match REMOTE_TOKEN.find(destination) {
        Some(token) => Destination::Remote {
            base_address: token.as_str().to_string(),
            sub_path: destination[token.end()..].to_string(),
        },
        None => Destination::Fixture {
            reference: destination.to_string(),
        },
    }
}
