//! Mock Map Middleware
//!
//! A development-time request interceptor that answers HTTP requests from
//! JSON fixture files or forwards them to a remote backend, driven by a
//! declarative route map. Frontend work keeps moving while the real backend
//! is unfinished, down, or somewhere else.
//!
//! # Features
//!
//! - **Declarative Routing**: One JSON file maps request paths to fixtures
//!   or remote backends; first matching entry wins
//! - **Parameter Filters**: Route on query-string and body parameters with
//!   `?key=value` suffixes on map keys
//! - **Fixture Variants**: One fixture file can hold several responses,
//!   selected by the request's parameters
//! - **Remote Forwarding**: Map entries starting with `http://` or
//!   `https://` hand the request to a real backend
//! - **Latency Simulation**: Fixture responses are delayed to keep loading
//!   states honest (1000ms by default)
//! - **Live Editing**: The route map is re-read on every request, so edits
//!   apply without a restart
//!
//! # Example Route Map
//!
//! ```json
//! {
//!     "/api/test": "mock/test1.json",
//!     "/api/test3": "http://localhost:3004/api/test4",
//!     "/api/test4?page=1": "mock/test4-1.json",
//!     "/api/test4": "mock/test4.json"
//! }
//! ```
//!
//! # Example Fixture With Variants
//!
//! ```json
//! {
//!     "page=1&name=a": { "code": 0, "data": [1, 2, 3] },
//!     "page=2&name=b": { "code": 0, "data": [4, 5, 6] }
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod fixture;
pub mod matcher;
pub mod params;
pub mod table;
pub mod target;

pub use config::MockOptions;
pub use engine::{MockEngine, MockRequest, Outcome};
pub use error::MockError;
