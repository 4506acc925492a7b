use ::bytes::Bytes;
use ::http::HeaderMap;
use ::http::HeaderValue;
use ::http::Method;
use ::http::header::AsHeaderName;
use ::std::fmt;
use ::std::net::SocketAddr;

use crate::internals::RequestPathFormatter;

/// A copy of the request exactly as it was handed to the handler.
///
/// Returned by [`TestResponse::request()`](crate::TestResponse::request()).
#[derive(Debug, Clone)]
pub struct DispatchedRequest {
    pub(crate) method: Method,
    pub(crate) request_uri: String,
    pub(crate) headers: HeaderMap<HeaderValue>,
    pub(crate) body: Bytes,
    pub(crate) remote_address: SocketAddr,
}

impl DispatchedRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path and query sent, such as `/users?page=2`.
    pub fn request_uri(&self) -> &str {
        &self.request_uri
    }

    /// The path sent, without any query.
    pub fn path(&self) -> &str {
        self.request_uri
            .split_once('?')
            .map(|(path, _)| path)
            .unwrap_or(&self.request_uri)
    }

    /// The raw query string sent, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.request_uri.split_once('?').map(|(_, query)| query)
    }

    pub fn headers(&self) -> &HeaderMap<HeaderValue> {
        &self.headers
    }

    pub fn maybe_header<N>(&self, header_name: N) -> Option<&HeaderValue>
    where
        N: AsHeaderName,
    {
        self.headers.get(header_name)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn remote_address(&self) -> SocketAddr {
        self.remote_address
    }
}

impl fmt::Display for DispatchedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatter = RequestPathFormatter::new(&self.method, &self.request_uri);
        write!(f, "{formatter}")
    }
}

#[cfg(test)]
mod test_path_and_query {
    use super::*;
    use ::pretty_assertions::assert_eq;

    fn new_request(request_uri: &str) -> DispatchedRequest {
        DispatchedRequest {
            method: Method::GET,
            request_uri: request_uri.to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            remote_address: "0.0.0.0:3000".parse().unwrap(),
        }
    }

    #[test]
    fn it_should_split_path_and_query() {
        let request = new_request("/test?a=1&b=2");

        assert_eq!(request.path(), "/test");
        assert_eq!(request.query(), Some("a=1&b=2"));
    }

    #[test]
    fn it_should_return_no_query_when_absent() {
        let request = new_request("/test");

        assert_eq!(request.path(), "/test");
        assert_eq!(request.query(), None);
    }

    #[test]
    fn it_should_display_method_and_uri() {
        let request = new_request("/test?a=1");

        assert_eq!(request.to_string(), "GET /test?a=1");
    }
}
