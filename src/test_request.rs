use ::axum::body::Body;
use ::axum::extract::ConnectInfo;
use ::bytes::Bytes;
use ::cookie::Cookie;
use ::cookie::CookieJar;
use ::http::HeaderMap;
use ::http::HeaderName;
use ::http::HeaderValue;
use ::http::Method;
use ::http::Request;
use ::http::Uri;
use ::http::header;
use ::serde::Serialize;
use ::std::fmt::Debug;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::std::sync::Arc;

use crate::DispatchedRequest;
use crate::Handler;
use crate::HtestError;
use crate::TestClientConfig;
use crate::TestResponse;
use crate::error::or_fail;
use crate::internals::QueryParamsStore;
use crate::internals::RequestBody;
use crate::internals::RequestPathFormatter;
use crate::internals::compose_request_path;
use crate::internals::dispatch;

///
/// A `TestRequest` builds up a single request to send to the handler.
///
/// Configure it using [`TestRequest::header()`], [`TestRequest::cookie()`],
/// [`TestRequest::query()`], [`TestRequest::form()`], and [`TestRequest::body_json()`].
/// Then call one of the verbs, such as [`TestRequest::get()`] or [`TestRequest::post()`].
/// That sends the request, blocks until the handler is done, and returns a [`TestResponse`].
///
/// A `TestRequest` is used once. The verbs consume it.
///
/// ```rust
/// use ::axum::Router;
/// use ::axum::routing::get;
/// use ::http::StatusCode;
///
/// let app = Router::new()
///     .route("/ping", get(|| async { "pong!" }));
///
/// let response = ::htest::new(app)
///     .header("x-request-id", "123")
///     .query("verbose", "true")
///     .get("/ping")
///     .expect_code(StatusCode::OK);
///
/// assert_eq!(response.text(), "pong!");
/// ```
///
/// Misconfiguration, such as calling `form` and `body_json` on the same request,
/// panics straight away. This fails the test that made the call.
#[must_use = "requests do nothing until a verb such as `get` or `post` is called"]
pub struct TestRequest {
    handler: Arc<dyn Handler>,
    config: TestClientConfig,

    headers: HeaderMap<HeaderValue>,
    query_params: QueryParamsStore,
    cookies: CookieJar,
    body: RequestBody,
}

impl TestRequest {
    /// Creates a request for the handler, using the default config.
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
        Self::from_shared_handler(Arc::new(handler), config)
    }

    pub(crate) fn from_shared_handler(handler: Arc<dyn Handler>, config: TestClientConfig) -> Self {
        Self {
            handler,
            config,
            headers: HeaderMap::new(),
            query_params: QueryParamsStore::new(),
            cookies: CookieJar::new(),
            body: RequestBody::Empty,
        }
    }

    /// Sets a header, replacing any values already set under that name.
    ///
    /// Header names are case insensitive.
    #[track_caller]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let (name, value) = or_fail(parse_header(name, value));
        self.headers.insert(name, value);
        self
    }

    /// Adds a header, keeping any values already set under that name.
    #[track_caller]
    pub fn append_header(mut self, name: &str, value: &str) -> Self {
        let (name, value) = or_fail(parse_header(name, value));
        self.headers.append(name, value);
        self
    }

    /// Adds a cookie to send. Setting the same name again replaces the value.
    ///
    /// This will panic if the name or value holds characters a cookie cannot carry,
    /// such as `;` or whitespace.
    #[track_caller]
    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        or_fail(validate_cookie(name, value));
        self.cookies.add(Cookie::new(name.to_string(), value.to_string()));
        self
    }

    /// Adds a query parameter.
    ///
    /// Parameters are never replaced. Adding the same key twice sends it twice,
    /// alongside any already in the path given to the verb.
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query_params.add(key, value);
        self
    }

    /// Sets a field of an url encoded form body.
    /// Setting the same key again replaces the earlier value.
    ///
    /// This will panic if the request already has a JSON body.
    #[track_caller]
    pub fn form(mut self, key: &str, value: &str) -> Self {
        or_fail(self.body.set_form_field(key.to_string(), value.to_string()));
        self
    }

    /// Sets the body of the request to send up as JSON.
    ///
    /// This will panic if a content type is already set,
    /// by an explicit header, a form, or an earlier call to this.
    /// It will also panic if the value cannot be serialized.
    #[track_caller]
    pub fn body_json<J>(mut self, value: &J) -> Self
    where
        J: ?Sized + Serialize,
    {
        let explicit_content_type = self.headers.get(header::CONTENT_TYPE);
        or_fail(self.body.set_json(value, explicit_content_type));
        self
    }

    /// Sends a HTTP GET request to the path.
    #[track_caller]
    pub fn get(self, path: &str) -> TestResponse {
        self.method(Method::GET, path)
    }

    /// Sends a HTTP POST request to the path.
    #[track_caller]
    pub fn post(self, path: &str) -> TestResponse {
        self.method(Method::POST, path)
    }

    /// Sends a HTTP PUT request to the path.
    #[track_caller]
    pub fn put(self, path: &str) -> TestResponse {
        self.method(Method::PUT, path)
    }

    /// Sends a HTTP PATCH request to the path.
    #[track_caller]
    pub fn patch(self, path: &str) -> TestResponse {
        self.method(Method::PATCH, path)
    }

    /// Sends a HTTP DELETE request to the path.
    #[track_caller]
    pub fn delete(self, path: &str) -> TestResponse {
        self.method(Method::DELETE, path)
    }

    /// Sends a request, to the path given, using the given method.
    #[track_caller]
    pub fn method(self, method: Method, path: &str) -> TestResponse {
        or_fail(self.try_send(method, path))
    }

    /// Sends the request, returning any failure instead of panicking.
    ///
    /// Panics raised by the handler itself are not caught.
    pub fn try_send(self, method: Method, path: &str) -> Result<TestResponse, HtestError> {
        let handler = self.handler.clone();
        let (request, dispatched_request) = self.build_request(method, path)?;

        let (parts, response_body) =
            dispatch(handler.as_ref(), request).map_err(|source| HtestError::Dispatch {
                request: dispatched_request.to_string(),
                source,
            })?;

        Ok(TestResponse::new(dispatched_request, parts, response_body))
    }

    /// Builds the request exactly as it would be sent, without sending it.
    #[track_caller]
    pub fn into_http_request(self, method: Method, path: &str) -> Request<Body> {
        or_fail(self.try_into_http_request(method, path))
    }

    pub fn try_into_http_request(
        self,
        method: Method,
        path: &str,
    ) -> Result<Request<Body>, HtestError> {
        let (request, _) = self.build_request(method, path)?;
        Ok(request)
    }

    fn build_request(
        self,
        method: Method,
        path: &str,
    ) -> Result<(Request<Body>, DispatchedRequest), HtestError> {
        let request_uri = build_request_uri(path, &self.query_params)?;
        let mut headers = self.headers;

        let body_bytes = match self.body.finish() {
            None => Bytes::new(),
            Some((body_bytes, default_content_type)) => {
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body_bytes.len()));

                let has_content_type = headers
                    .get(header::CONTENT_TYPE)
                    .is_some_and(|content_type| !content_type.is_empty());
                if !has_content_type {
                    headers.insert(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static(default_content_type),
                    );
                }

                body_bytes
            }
        };

        if !headers.contains_key(header::USER_AGENT) {
            let user_agent = HeaderValue::from_str(&self.config.user_agent).map_err(|_| {
                HtestError::configuration(format!(
                    "user agent {:?} is not a valid header value",
                    self.config.user_agent
                ))
            })?;
            headers.insert(header::USER_AGENT, user_agent);
        }

        let existing_cookie_header = headers.get(header::COOKIE);
        if let Some(cookie_header) = build_cookie_header(&self.cookies, existing_cookie_header)? {
            headers.insert(header::COOKIE, cookie_header);
        }

        let remote_address = self.config.remote_address;
        let request_uri_raw = request_uri.to_string();
        let mut request = Request::builder()
            .method(method.clone())
            .uri(request_uri)
            .body(Body::from(body_bytes.clone()))
            .map_err(|err| {
                let debug_request_format = RequestPathFormatter::new(&method, &request_uri_raw);
                HtestError::configuration(format!(
                    "failed to build request {debug_request_format}, {err}"
                ))
            })?;
        *request.headers_mut() = headers.clone();
        request.extensions_mut().insert(ConnectInfo(remote_address));

        let dispatched_request = DispatchedRequest {
            method,
            request_uri: request_uri_raw,
            headers,
            body: body_bytes,
            remote_address,
        };

        Ok((request, dispatched_request))
    }
}

impl Debug for TestRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TestRequest")
            .field("handler", &"{unknown}")
            .field("config", &self.config)
            .field("headers", &self.headers)
            .field("query_params", &self.query_params)
            .field("cookies", &self.cookies)
            .field("body", &self.body)
            .finish()
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), HtestError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| HtestError::configuration(format!("invalid header name {name:?}")))?;
    let header_value = HeaderValue::from_str(value).map_err(|_| {
        HtestError::configuration(format!("invalid value {value:?} for header {name:?}"))
    })?;

    Ok((header_name, header_value))
}

fn build_request_uri(path: &str, query_params: &QueryParamsStore) -> Result<Uri, HtestError> {
    if !path.starts_with('/') {
        return Err(HtestError::parse(path, "request path must start with '/'"));
    }

    let request_path = compose_request_path(path, query_params)?;
    request_path
        .parse::<Uri>()
        .map_err(|err| HtestError::parse(&request_path, err.to_string()))
}

/// Cookie names must be tokens. Values may not hold separators, quotes,
/// whitespace, or control characters.
fn validate_cookie(name: &str, value: &str) -> Result<(), HtestError> {
    let is_valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?={}".contains(c));
    if !is_valid_name {
        return Err(HtestError::configuration(format!("invalid cookie name {name:?}")));
    }

    let is_valid_value = value
        .chars()
        .all(|c| c.is_ascii_graphic() && !"\",;\\".contains(c));
    if !is_valid_value {
        return Err(HtestError::configuration(format!(
            "invalid value {value:?} for cookie {name:?}"
        )));
    }

    Ok(())
}

/// Joins the cookies into one `name=value; name=value` header,
/// after any cookie header that was set explicitly.
fn build_cookie_header(
    cookies: &CookieJar,
    existing_header: Option<&HeaderValue>,
) -> Result<Option<HeaderValue>, HtestError> {
    let mut sorted: Vec<&Cookie<'static>> = cookies.iter().collect();
    if sorted.is_empty() {
        return Ok(None);
    }
    sorted.sort_by(|a, b| a.name().cmp(b.name()));

    let mut parts: Vec<String> = existing_header
        .and_then(|header| header.to_str().ok())
        .filter(|header| !header.is_empty())
        .map(|header| vec![header.to_string()])
        .unwrap_or_default();
    parts.extend(sorted.into_iter().map(|cookie| cookie.stripped().to_string()));

    let cookie_raw = parts.join("; ");
    let header_value = HeaderValue::from_str(&cookie_raw).map_err(|_| {
        HtestError::configuration(format!("cookies {cookie_raw:?} are not a valid header value"))
    })?;

    Ok(Some(header_value))
}


#[cfg(test)]
mod test_cookie {
    use crate::TestRequest;
    use ::axum::Router;
    use ::http::Method;
    use ::http::header;
    use ::pretty_assertions::assert_eq;

    #[test]
    fn it_should_join_cookies_into_one_header() {
        let request = TestRequest::new(Router::new())
            .cookie("session", "abc")
            .cookie("theme", "dark")
            .into_http_request(Method::GET, "/");

        assert_eq!(request.headers()[header::COOKIE], "session=abc; theme=dark");
    }

    #[test]
    fn it_should_replace_cookies_with_the_same_name() {
        let request = TestRequest::new(Router::new())
            .cookie("session", "first")
            .cookie("session", "second")
            .into_http_request(Method::GET, "/");

        assert_eq!(request.headers()[header::COOKIE], "session=second");
    }

    #[test]
    fn it_should_add_to_an_explicit_cookie_header() {
        let request = TestRequest::new(Router::new())
            .header("cookie", "raw=1")
            .cookie("session", "abc")
            .into_http_request(Method::GET, "/");

        assert_eq!(request.headers()[header::COOKIE], "raw=1; session=abc");
    }

    #[test]
    #[should_panic(expected = "invalid value \"x; admin=1\" for cookie \"session\"")]
    fn it_should_panic_on_values_that_would_add_more_cookies() {
        let _ = TestRequest::new(Router::new()).cookie("session", "x; admin=1");
    }

    #[test]
    #[should_panic(expected = "invalid cookie name \"bad=name\"")]
    fn it_should_panic_on_invalid_cookie_names() {
        let _ = TestRequest::new(Router::new()).cookie("bad=name", "value");
    }

    #[test]
    fn it_should_allow_empty_values() {
        let request = TestRequest::new(Router::new())
            .cookie("session", "")
            .into_http_request(Method::GET, "/");

        assert_eq!(request.headers()[header::COOKIE], "session=");
    }

    #[test]
    fn it_should_send_no_cookie_header_without_cookies() {
        let request = TestRequest::new(Router::new()).into_http_request(Method::GET, "/");

        assert!(request.headers().get(header::COOKIE).is_none());
    }
}
