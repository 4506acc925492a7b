use ::bytes::Bytes;
use ::cookie::Cookie;
use ::http::HeaderMap;
use ::http::HeaderValue;
use ::http::StatusCode;
use ::http::header;
use ::http::header::AsHeaderName;
use ::http::response::Parts;
use ::serde::de::DeserializeOwned;
use ::std::fmt::Display;

use crate::DispatchedRequest;
use crate::HtestError;
use crate::error::or_fail;
use crate::internals::DebugResponseBody;
use crate::internals::JSON_CONTENT_TYPE;

///
/// The `TestResponse` is what the handler sent back, captured in full.
/// It is returned by the verbs on [`TestRequest`](crate::TestRequest), such as `get` and `post`.
///
/// ```rust
/// use ::axum::Json;
/// use ::axum::Router;
/// use ::axum::routing::get;
/// use ::http::StatusCode;
/// use ::serde::Deserialize;
/// use ::serde_json::json;
///
/// #[derive(Deserialize, Default)]
/// struct Todo {
///     description: String,
/// }
///
/// let app = Router::new()
///     .route("/todo", get(|| async { Json(json!({ "description": "buy milk" })) }));
///
/// let mut todo = Todo::default();
/// ::htest::new(app)
///     .get("/todo")
///     .expect_code(StatusCode::OK)
///     .json(&mut todo);
///
/// assert_eq!(todo.description, "buy milk");
/// ```
///
#[derive(Clone, Debug)]
pub struct TestResponse {
    request: DispatchedRequest,
    status_code: StatusCode,
    headers: HeaderMap<HeaderValue>,
    response_body: Bytes,
    cookies: Vec<Cookie<'static>>,
}

impl TestResponse {
    pub(crate) fn new(request: DispatchedRequest, parts: Parts, response_body: Bytes) -> Self {
        let cookies = parse_cookies(&request, &parts.headers);

        Self {
            request,
            status_code: parts.status,
            headers: parts.headers,
            response_body,
            cookies,
        }
    }

    /// The status code of the response.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// The request that produced this response, as the handler received it.
    #[must_use]
    pub fn request(&self) -> &DispatchedRequest {
        &self.request
    }

    /// Returns the headers returned from the response.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap<HeaderValue> {
        &self.headers
    }

    /// Finds a header with the given name.
    /// If there are multiple headers with the same name,
    /// then only the first will be returned.
    ///
    /// `None` is returned when no header was found.
    #[must_use]
    pub fn maybe_header<N>(&self, header_name: N) -> Option<&HeaderValue>
    where
        N: AsHeaderName,
    {
        self.headers.get(header_name)
    }

    /// Finds a header with the given name.
    ///
    /// If no header is found, then this will panic.
    #[must_use]
    #[track_caller]
    pub fn header<N>(&self, header_name: N) -> &HeaderValue
    where
        N: AsHeaderName + Display + Clone,
    {
        let debug_header = header_name.clone();
        match self.headers.get(header_name) {
            Some(header_value) => header_value,
            None => panic!(
                "Cannot find header {debug_header}, for response to request {}",
                self.request
            ),
        }
    }

    /// The `Content-Type` of the response, if there is one.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|content_type| content_type.to_str().ok())
    }

    /// Returns the raw underlying response body.
    #[must_use]
    pub fn as_bytes(&self) -> &Bytes {
        &self.response_body
    }

    /// Consumes this returning the underlying `Bytes` in the response.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.response_body
    }

    /// Returns the underlying response, extracted as a UTF-8 string.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.response_body).to_string()
    }

    /// Decodes the JSON body into `target`.
    ///
    /// This only happens when the response `Content-Type` starts with `application/json`.
    /// For any other content type `target` is left untouched.
    ///
    /// Panics if the content type is JSON but the body does not decode.
    #[track_caller]
    pub fn json<T>(self, target: &mut T) -> Self
    where
        T: DeserializeOwned,
    {
        if let Some(value) = or_fail(self.try_json::<T>()) {
            *target = value;
        }

        self
    }

    /// Decodes the JSON body, returning `None` when the response is not JSON.
    ///
    /// Panics if the content type is JSON but the body does not decode.
    #[must_use]
    #[track_caller]
    pub fn maybe_json<T>(&self) -> Option<T>
    where
        T: DeserializeOwned,
    {
        or_fail(self.try_json())
    }

    pub fn try_json<T>(&self) -> Result<Option<T>, HtestError>
    where
        T: DeserializeOwned,
    {
        if !self.is_json() {
            return Ok(None);
        }

        ::serde_json::from_slice::<T>(&self.response_body)
            .map(Some)
            .map_err(|source| {
                let debug_body = DebugResponseBody {
                    content_type: self.content_type(),
                    body: &self.response_body,
                };

                HtestError::Serialization {
                    message: format!(
                        "Failed to deserialize JSON response for request {}, {source}\nBody: {debug_body}",
                        self.request
                    ),
                    source,
                }
            })
    }

    fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|content_type| content_type.starts_with(JSON_CONTENT_TYPE))
    }

    /// Checks the status code matches the one expected.
    ///
    /// On a mismatch this panics, with both codes and the full response body.
    #[track_caller]
    pub fn expect_code(self, expected: StatusCode) -> Self {
        or_fail(self.try_expect_code(expected));
        self
    }

    pub fn try_expect_code(&self, expected: StatusCode) -> Result<(), HtestError> {
        if self.status_code == expected {
            return Ok(());
        }

        Err(HtestError::Assertion(format!(
            "expecting http response status code {expected}, received {}, for request {}, body: {}",
            self.status_code,
            self.request,
            self.text()
        )))
    }

    /// Returns all of the cookies set by the response, in the order they were sent.
    ///
    /// This is empty when there are no `Set-Cookie` headers.
    #[must_use]
    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    /// Finds a [`Cookie`] with the given name.
    /// If there are multiple matching cookies,
    /// then only the first will be returned.
    ///
    /// `None` is returned if no Cookie is found.
    #[must_use]
    pub fn maybe_cookie(&self, cookie_name: &str) -> Option<&Cookie<'static>> {
        self.cookies
            .iter()
            .find(|cookie| cookie.name() == cookie_name)
    }

    /// Finds a [`Cookie`] with the given name.
    ///
    /// If no `Cookie` is found, then this will panic.
    #[must_use]
    #[track_caller]
    pub fn cookie(&self, cookie_name: &str) -> &Cookie<'static> {
        match self.maybe_cookie(cookie_name) {
            Some(cookie) => cookie,
            None => panic!(
                "Cannot find cookie {cookie_name}, for response to request {}",
                self.request
            ),
        }
    }
}

impl From<TestResponse> for Bytes {
    fn from(response: TestResponse) -> Self {
        response.into_bytes()
    }
}

/// Parses every `Set-Cookie` header.
/// Ones which cannot be parsed are skipped.
fn parse_cookies(
    request: &DispatchedRequest,
    headers: &HeaderMap<HeaderValue>,
) -> Vec<Cookie<'static>> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|header_value| {
            let Ok(raw_cookie) = header_value.to_str() else {
                ::tracing::warn!(%request, "skipping Set-Cookie header that is not valid text");
                return None;
            };

            match Cookie::parse(raw_cookie.to_string()) {
                Ok(cookie) => Some(cookie),
                Err(err) => {
                    ::tracing::warn!(
                        %request,
                        raw_cookie,
                        %err,
                        "skipping malformed Set-Cookie header"
                    );
                    None
                }
            }
        })
        .collect()
}




#[cfg(test)]
mod test_headers_and_body {
    use crate::TestRequest;
    use ::axum::Router;
    use ::axum::routing::get;
    use ::bytes::Bytes;
    use ::http::header;
    use ::pretty_assertions::assert_eq;

    fn new_router() -> Router {
        Router::new().route(
            "/text",
            get(|| async { ([("x-custom", "custom-value")], "hello!") }),
        )
    }

    #[test]
    fn it_should_expose_headers() {
        let response = TestRequest::new(new_router()).get("/text");

        assert_eq!(response.header("X-Custom"), "custom-value");
        assert_eq!(
            response.content_type(),
            Some("text/plain; charset=utf-8")
        );
        assert!(response.maybe_header(header::ETAG).is_none());
    }

    #[test]
    fn it_should_expose_body_as_bytes_and_text() {
        let response = TestRequest::new(new_router()).get("/text");

        assert_eq!(response.as_bytes(), &Bytes::from("hello!"));
        assert_eq!(response.text(), "hello!");
        assert_eq!(Bytes::from(response), Bytes::from("hello!"));
    }

    #[test]
    #[should_panic(expected = "Cannot find header x-missing")]
    fn it_should_panic_when_header_is_missing() {
        let _ = TestRequest::new(new_router()).get("/text").header("x-missing");
    }
}
