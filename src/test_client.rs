use ::http::Method;
use ::std::fmt::Debug;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::std::sync::Arc;

use crate::Handler;
use crate::TestClientConfig;
use crate::TestClientConfigBuilder;
use crate::TestRequest;
use crate::TestResponse;

///
/// The `TestClient` holds your application,
/// and hands out a fresh [`TestRequest`] for each request you make.
///
/// ```rust
/// use ::axum::Router;
/// use ::axum::routing::get;
/// use ::http::StatusCode;
/// use ::htest::TestClient;
///
/// let app = Router::new()
///     .route("/ping", get(|| async { "pong!" }));
///
/// let client = TestClient::new(app);
///
/// // Send a request straight away.
/// client.get("/ping").expect_code(StatusCode::OK);
///
/// // Or configure it first.
/// client
///     .request()
///     .header("x-request-id", "abc")
///     .get("/ping")
///     .expect_code(StatusCode::OK);
/// ```
///
/// Requests never share state with one another.
#[derive(Clone)]
pub struct TestClient {
    handler: Arc<dyn Handler>,
    config: TestClientConfig,
}

impl TestClient {
    /// Wraps the handler using the default config.
    pub fn new<H>(handler: H) -> Self
    where
        H: Handler + 'static,
    {
        Self::new_with_config(handler, TestClientConfig::default())
    }

    pub fn new_with_config<H>(handler: H, config: TestClientConfig) -> Self
    where
        H: Handler + 'static,
    {
        Self {
            handler: Arc::new(handler),
            config,
        }
    }

    /// Creates a `TestClientConfigBuilder`, for building a client with custom config.
    pub fn builder() -> TestClientConfigBuilder {
        TestClientConfig::builder()
    }

    pub fn config(&self) -> &TestClientConfig {
        &self.config
    }

    /// Creates a new request, ready to be configured and sent.
    pub fn request(&self) -> TestRequest {
        TestRequest::from_shared_handler(self.handler.clone(), self.config.clone())
    }

    /// Sends a HTTP GET request to the path.
    #[track_caller]
    pub fn get(&self, path: &str) -> TestResponse {
        self.method(Method::GET, path)
    }

    /// Sends a HTTP POST request to the path.
    #[track_caller]
    pub fn post(&self, path: &str) -> TestResponse {
        self.method(Method::POST, path)
    }

    /// Sends a HTTP PUT request to the path.
    #[track_caller]
    pub fn put(&self, path: &str) -> TestResponse {
        self.method(Method::PUT, path)
    }

    /// Sends a HTTP PATCH request to the path.
    #[track_caller]
    pub fn patch(&self, path: &str) -> TestResponse {
        self.method(Method::PATCH, path)
    }

    /// Sends a HTTP DELETE request to the path.
    #[track_caller]
    pub fn delete(&self, path: &str) -> TestResponse {
        self.method(Method::DELETE, path)
    }

    /// Sends a request, to the path given, using the given method.
    #[track_caller]
    pub fn method(&self, method: Method, path: &str) -> TestResponse {
        self.request().method(method, path)
    }
}

impl Debug for TestClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "TestClient {{ handler: {{unknown}}, config: {:?} }}",
            self.config
        )
    }
}
