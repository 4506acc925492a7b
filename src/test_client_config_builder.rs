use ::std::net::SocketAddr;

use crate::TestClient;
use crate::TestClientConfig;
use crate::Handler;

/// This is for easing the building of [`TestClientConfig`](crate::TestClientConfig).
///
/// ```rust
/// use ::htest::TestClientConfig;
///
/// let config = TestClientConfig::builder()
///     .user_agent("my-test-suite")
///     .remote_address("127.0.0.1:8080".parse().unwrap())
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct TestClientConfigBuilder {
    config: TestClientConfig,
}

impl TestClientConfigBuilder {
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.config.user_agent = user_agent.to_string();
        self
    }

    pub fn remote_address(mut self, remote_address: SocketAddr) -> Self {
        self.config.remote_address = remote_address;
        self
    }

    pub fn build(self) -> TestClientConfig {
        self.config
    }

    /// Builds the config, and uses it to create a [`TestClient`].
    pub fn build_client<H>(self, handler: H) -> TestClient
    where
        H: Handler + 'static,
    {
        TestClient::new_with_config(handler, self.build())
    }
}
