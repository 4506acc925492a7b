use ::std::net::IpAddr;
use ::std::net::Ipv4Addr;
use ::std::net::SocketAddr;

use crate::TestClientConfigBuilder;

pub const DEFAULT_USER_AGENT: &str = "htest-client";
pub const DEFAULT_REMOTE_ADDRESS: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000);

/// The settings shared by every request a [`TestClient`](crate::TestClient) builds.
#[derive(Debug, Clone, PartialEq)]
pub struct TestClientConfig {
    /// Sent as the `User-Agent` header,
    /// unless a request sets its own.
    ///
    /// **Defaults** to `htest-client`.
    pub user_agent: String,

    /// The address requests appear to come from.
    /// Handlers can read it using [`axum::extract::ConnectInfo`].
    ///
    /// **Defaults** to `0.0.0.0:3000`.
    pub remote_address: SocketAddr,
}

impl TestClientConfig {
    /// Creates a default `TestClientConfigBuilder`.
    pub fn builder() -> TestClientConfigBuilder {
        TestClientConfigBuilder::default()
    }
}

impl Default for TestClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            remote_address: DEFAULT_REMOTE_ADDRESS,
        }
    }
}
