//! Request interception driver.
//!
//! [`MockEngine::intercept`] is the crate's entry point: it re-reads the
//! route map, merges the request's query and body parameters, walks the
//! table for the first matching route and then either forwards the request
//! to a remote backend, answers it from a fixture after the configured
//! delay, or declares it unhandled so the caller can let the real handler
//! run. The embedding host supplies the transport and response channel
//! through the [`ForwardingTransport`] and [`ResponseSink`] traits.

use crate::config::MockOptions;
use crate::error::MockError;
use crate::fixture::{self, FixtureStore, FsFixtureStore};
use crate::matcher;
use crate::params;
use crate::table::RouteTable;
use crate::target::{self, Destination};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// The parts of an incoming request the interceptor looks at.
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// Request path, without the query string.
    pub path: String,
    /// Decoded query-string parameters.
    pub query: HashMap<String, String>,
    /// Decoded body parameters.
    pub body: HashMap<String, String>,
}

impl MockRequest {
    /// Request for `path` with no parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: HashMap::new(),
            body: HashMap::new(),
        }
    }

    /// Add a query-string parameter.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a body parameter.
    pub fn with_body_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }
}

/// Hands a request over to a remote backend.
///
/// The implementation is expected to preserve the original query string and
/// body and to rewrite the Host header for the new address; the engine only
/// tells it where to go.
#[async_trait]
pub trait ForwardingTransport: Send + Sync {
    /// Forward the in-flight request to `base_address`, at `sub_path`.
    async fn forward(&self, base_address: &str, sub_path: &str) -> anyhow::Result<()>;
}

/// Delivers a fixture value as the response to the in-flight request.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Emit `value` as the response body.
    async fn send(&self, value: Value);
}

/// What the engine did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No route matched; the caller should run its normal handler.
    PassThrough,
    /// The request was handed to the forwarding transport.
    Forwarded {
        base_address: String,
        sub_path: String,
    },
    /// A fixture value was emitted through the response sink.
    Responded { reference: String },
}

/// Mock middleware engine.
///
/// Cheap to clone; the fixture store is shared. The route map file is read
/// afresh on every [`intercept`](MockEngine::intercept) call so edits apply
/// to the next request without a restart.
#[derive(Clone)]
pub struct MockEngine {
    options: MockOptions,
    store: Arc<dyn FixtureStore>,
}

impl MockEngine {
    /// Engine reading fixtures from the process working directory.
    pub fn new(options: MockOptions) -> Self {
        Self {
            options,
            store: Arc::new(FsFixtureStore::new()),
        }
    }

    /// Replace the fixture store, e.g. to pin the fixture directory or to
    /// serve fixtures from somewhere other than the filesystem.
    pub fn with_fixture_store(mut self, store: Arc<dyn FixtureStore>) -> Self {
        self.store = store;
        self
    }

    /// The options this engine was built with.
    pub fn options(&self) -> &MockOptions {
        &self.options
    }

    /// Intercept one request.
    ///
    /// Returns how the request was handled, or the first error hit while
    /// reading the route map, loading a fixture, or forwarding. An unmatched
    /// request is not an error; it comes back as [`Outcome::PassThrough`].
    pub async fn intercept(
        &self,
        request: &MockRequest,
        transport: &dyn ForwardingTransport,
        sink: &dyn ResponseSink,
    ) -> Result<Outcome, MockError> {
        let table = RouteTable::from_file(&self.options.map).await?;
        let merged = params::merge_params(&request.query, &request.body);

        let entry = match matcher::match_route(&request.path, &table, &merged) {
            Some(entry) => entry,
            None => {
                debug!(path = %request.path, "no route matched, passing the request through");
                return Ok(Outcome::PassThrough);
            }
        };
        info!(path = %request.path, pattern = %entry.pattern(), "route matched");

        match target::classify(entry.destination()) {
            Destination::Remote {
                base_address,
                sub_path,
            } => {
                info!(base = %base_address, sub_path = %sub_path, "forwarding to remote backend");
                transport.forward(&base_address, &sub_path).await?;
                Ok(Outcome::Forwarded {
                    base_address,
                    sub_path,
                })
            }
            Destination::Fixture { reference } => {
                let value = fixture::resolve(self.store.as_ref(), &reference, &merged).await?;
                if self.options.delay > 0 {
                    debug!(delay_ms = self.options.delay, "simulating backend latency");
                    tokio::time::sleep(Duration::from_millis(self.options.delay)).await;
                }
                sink.send(value).await;
                info!(path = %request.path, reference = %reference, "answered from fixture");
                Ok(Outcome::Responded { reference })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FixtureError;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Instant;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ForwardingTransport for RecordingTransport {
        async fn forward(&self, base_address: &str, sub_path: &str) -> anyhow::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((base_address.to_string(), sub_path.to_string()));
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl ForwardingTransport for FailingTransport {
        async fn forward(&self, _base_address: &str, _sub_path: &str) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl ResponseSink for RecordingSink {
        async fn send(&self, value: Value) {
            self.sent.lock().unwrap().push(value);
        }
    }

    struct StaticStore(Value);

    #[async_trait]
    impl FixtureStore for StaticStore {
        async fn load(&self, _reference: &str) -> Result<Value, FixtureError> {
            Ok(self.0.clone())
        }
    }

    fn engine_for(dir: &TempDir, map: &str, delay: u64) -> MockEngine {
        let map_path = dir.path().join("mock-map.json");
        std::fs::write(&map_path, map).unwrap();
        MockEngine::new(MockOptions::new(map_path).with_delay(delay))
            .with_fixture_store(Arc::new(FsFixtureStore::with_root(dir.path())))
    }

    fn write_fixture(dir: &TempDir, relative: &str, content: &str) {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_fixture_route_answers_request() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(&dir, "mock/test1.json", r#"{"code": 0, "data": [1, 2, 3]}"#);
        let engine = engine_for(&dir, r#"{"/api/test": "mock/test1.json"}"#, 0);

        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        let outcome = engine
            .intercept(&MockRequest::new("/api/test"), &transport, &sink)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Responded {
                reference: "mock/test1.json".to_string()
            }
        );
        assert_eq!(
            sink.sent.lock().unwrap().as_slice(),
            &[json!({"code": 0, "data": [1, 2, 3]})]
        );
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_request_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_for(&dir, r#"{"/api/test": "mock/test1.json"}"#, 0);

        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        let outcome = engine
            .intercept(&MockRequest::new("/health"), &transport, &sink)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::PassThrough);
        assert!(sink.sent.lock().unwrap().is_empty());
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remote_route_is_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_for(
            &dir,
            r#"{"/api/test3": "http://localhost:3004/api/test4"}"#,
            0,
        );

        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        let outcome = engine
            .intercept(&MockRequest::new("/api/test3"), &transport, &sink)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Forwarded {
                base_address: "http://localhost:3004".to_string(),
                sub_path: "/api/test4".to_string()
            }
        );
        assert_eq!(
            transport.calls.lock().unwrap().as_slice(),
            &[(
                "http://localhost:3004".to_string(),
                "/api/test4".to_string()
            )]
        );
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filtered_route_and_paged_fixture() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(&dir, "mock/test4-1.json", r#"{"code": 0, "data": ["first"]}"#);
        write_fixture(
            &dir,
            "mock/test4.json",
            r#"{
                "page=1": {"code": 0, "data": [1]},
                "page=2": {"code": 0, "data": [2]}
            }"#,
        );
        let engine = engine_for(
            &dir,
            r#"{
                "/api/test4?page=1": "mock/test4-1.json",
                "/api/test4": "mock/test4.json"
            }"#,
            0,
        );

        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();

        // page=1 hits the filtered route and its dedicated fixture.
        let outcome = engine
            .intercept(
                &MockRequest::new("/api/test4").with_query_param("page", "1"),
                &transport,
                &sink,
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Responded {
                reference: "mock/test4-1.json".to_string()
            }
        );

        // page=2 falls past the filter onto the unfiltered route, whose
        // fixture picks the variant for page=2.
        let outcome = engine
            .intercept(
                &MockRequest::new("/api/test4").with_query_param("page", "2"),
                &transport,
                &sink,
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Responded {
                reference: "mock/test4.json".to_string()
            }
        );
        assert_eq!(
            sink.sent.lock().unwrap().as_slice(),
            &[
                json!({"code": 0, "data": ["first"]}),
                json!({"code": 0, "data": [2]})
            ]
        );
    }

    #[tokio::test]
    async fn test_body_params_participate_in_matching() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(&dir, "mock/admin.json", r#"{"code": 0, "data": "admin"}"#);
        let engine = engine_for(&dir, r#"{"/api/login?role=admin": "mock/admin.json"}"#, 0);

        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        let outcome = engine
            .intercept(
                &MockRequest::new("/api/login").with_body_param("role", "admin"),
                &transport,
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Responded {
                reference: "mock/admin.json".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_fixture_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_for(&dir, r#"{"/api/test": "mock/absent.json"}"#, 0);

        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        let result = engine
            .intercept(&MockRequest::new("/api/test"), &transport, &sink)
            .await;

        assert!(matches!(result, Err(MockError::Fixture(_))));
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_map_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = MockEngine::new(MockOptions::new(dir.path().join("absent-map.json")));

        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        let result = engine
            .intercept(&MockRequest::new("/api/test"), &transport, &sink)
            .await;

        assert!(matches!(result, Err(MockError::Table(_))));
    }

    #[tokio::test]
    async fn test_transport_error_is_forwarded_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_for(&dir, r#"{"/api/test3": "http://localhost:3004"}"#, 0);

        let sink = RecordingSink::default();
        let result = engine
            .intercept(&MockRequest::new("/api/test3"), &FailingTransport, &sink)
            .await;

        let error = result.unwrap_err();
        assert!(matches!(error, MockError::Forward(_)));
        assert!(error.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_delay_elapses_before_fixture_response() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(&dir, "mock/test1.json", r#"{"code": 0}"#);
        let engine = engine_for(&dir, r#"{"/api/test": "mock/test1.json"}"#, 50);
        assert_eq!(engine.options().delay, 50);

        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        let start = Instant::now();
        engine
            .intercept(&MockRequest::new("/api/test"), &transport, &sink)
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_delay_skips_latency_simulation() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(&dir, "mock/test1.json", r#"{"code": 0}"#);
        let engine = engine_for(&dir, r#"{"/api/test": "mock/test1.json"}"#, 0);

        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        let start = Instant::now();
        engine
            .intercept(&MockRequest::new("/api/test"), &transport, &sink)
            .await
            .unwrap();

        // The 1000ms default must not sneak back in when the delay is zero.
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_map_edits_apply_to_the_next_request() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(&dir, "mock/test1.json", r#"{"code": 0, "data": "old"}"#);
        write_fixture(&dir, "mock/test2.json", r#"{"code": 0, "data": "new"}"#);
        let engine = engine_for(&dir, r#"{"/api/test": "mock/test1.json"}"#, 0);

        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        engine
            .intercept(&MockRequest::new("/api/test"), &transport, &sink)
            .await
            .unwrap();

        std::fs::write(
            dir.path().join("mock-map.json"),
            r#"{"/api/test": "mock/test2.json"}"#,
        )
        .unwrap();
        engine
            .intercept(&MockRequest::new("/api/test"), &transport, &sink)
            .await
            .unwrap();

        assert_eq!(
            sink.sent.lock().unwrap().as_slice(),
            &[
                json!({"code": 0, "data": "old"}),
                json!({"code": 0, "data": "new"})
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_engine() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(&dir, "mock/test1.json", r#"{"code": 0, "data": 1}"#);
        write_fixture(&dir, "mock/test2.json", r#"{"code": 0, "data": 2}"#);
        let engine = engine_for(
            &dir,
            r#"{
                "/api/test2": "mock/test2.json",
                "/api/test": "mock/test1.json"
            }"#,
            0,
        );

        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        // The requests must outlive the joined futures that borrow them.
        let request1 = MockRequest::new("/api/test");
        let request2 = MockRequest::new("/api/test2");
        let (first, second) = tokio::join!(
            engine.intercept(&request1, &transport, &sink),
            engine.intercept(&request2, &transport, &sink)
        );

        assert_eq!(
            first.unwrap(),
            Outcome::Responded {
                reference: "mock/test1.json".to_string()
            }
        );
        assert_eq!(
            second.unwrap(),
            Outcome::Responded {
                reference: "mock/test2.json".to_string()
            }
        );
        assert_eq!(sink.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_custom_fixture_store() {
        let dir = tempfile::tempdir().unwrap();
        let map_path = dir.path().join("mock-map.json");
        std::fs::write(&map_path, r#"{"/api/test": "anything"}"#).unwrap();
        let engine = MockEngine::new(MockOptions::new(map_path).with_delay(0))
            .with_fixture_store(Arc::new(StaticStore(json!({"code": 0, "data": "canned"}))));

        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        let outcome = engine
            .intercept(&MockRequest::new("/api/test"), &transport, &sink)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Responded {
                reference: "anything".to_string()
            }
        );
        assert_eq!(
            sink.sent.lock().unwrap().as_slice(),
            &[json!({"code": 0, "data": "canned"})]
        );
    }
}
