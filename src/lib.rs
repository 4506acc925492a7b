//!
//! Htest is a library for testing Axum applications, and other Tower services,
//! without opening a socket:
//!
//!  * You create a [`TestRequest`] for your application,
//!  * configure the headers, cookies, query, and body it should send,
//!  * call a verb such as [`TestRequest::get()`], which hands the request to your application
//!    and blocks until it responds,
//!  * then inspect the [`TestResponse`] you get back.
//!
//! Everything is synchronous. Tests are plain `#[test]` functions.
//!
//! ## Getting Started
//!
//! ```rust
//! use ::axum::Json;
//! use ::axum::Router;
//! use ::axum::extract::Query;
//! use ::axum::routing::get;
//! use ::http::StatusCode;
//! use ::serde::Deserialize;
//! use ::serde::Serialize;
//! use ::std::collections::HashMap;
//!
//! #[derive(Serialize, Deserialize, Default)]
//! struct Found {
//!     i: u32,
//!     q: String,
//! }
//!
//! async fn route_get_test(Query(params): Query<HashMap<String, String>>) -> Json<Found> {
//!     Json(Found {
//!         i: 5,
//!         q: params.get("q").cloned().unwrap_or_default(),
//!     })
//! }
//!
//! let app = Router::new().route("/test", get(route_get_test));
//!
//! let mut found = Found::default();
//! ::htest::new(app)
//!     .query("q", "v")
//!     .get("/test")
//!     .expect_code(StatusCode::OK)
//!     .json(&mut found);
//!
//! assert_eq!(found.i, 5);
//! assert_eq!(found.q, "v");
//! ```
//!
//! ## Request Bodies
//!
//! A request can send an url encoded form, built up using [`TestRequest::form()`],
//! or a JSON body using [`TestRequest::body_json()`]. Not both.
//! Mixing them panics, failing the test.
//!
//! The `Content-Type` and `Content-Length` headers are filled in for you.
//! A `Content-Type` header you set yourself is never replaced.
//!
//! ## Failing Tests
//!
//! Misconfigured requests, malformed paths, and unmet expectations all panic
//! with a message describing what went wrong. Most of these have a `try_*` version
//! returning an [`HtestError`] instead.
//!
//! Panics raised inside your application are not caught.
//!
//! ## Tokio
//!
//! Outside of Tokio, each request runs on a small runtime created just for it.
//! Inside a multi threaded runtime, such as `#[tokio::test(flavor = "multi_thread")]`,
//! requests block in place. A single threaded runtime cannot be blocked,
//! and sending a request from one fails.
//!

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub(crate) mod internals;

mod error;
pub use self::error::HtestError;

mod handler;
pub use self::handler::*;

mod dispatched_request;
pub use self::dispatched_request::*;

mod test_client;
pub use self::test_client::*;

mod test_client_config;
pub use self::test_client_config::*;

mod test_client_config_builder;
pub use self::test_client_config_builder::*;

mod test_request;
pub use self::test_request::*;

mod test_response;
pub use self::test_response::*;

pub use ::cookie;
pub use ::http;

/// Creates a new [`TestRequest`] for the handler, using the default config.
pub fn new<H>(handler: H) -> TestRequest
where
    H: Handler + 'static,
{
    TestRequest::new(handler)
}

#[cfg(test)]
mod integrated_test_cookies {
    use super::*;

    use ::axum::Router;
    use ::axum::routing::get;
    use ::axum_extra::extract::cookie::Cookie as AxumCookie;
    use ::axum_extra::extract::cookie::CookieJar;
    use ::pretty_assertions::assert_eq;

    const TEST_COOKIE_NAME: &str = "test-cookie";

    async fn get_cookie(cookies: CookieJar) -> String {
        cookies
            .get(TEST_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .unwrap_or_else(|| "cookie-not-found".to_string())
    }

    async fn get_set_cookie(cookies: CookieJar) -> (CookieJar, &'static str) {
        let mut cookie = AxumCookie::new(TEST_COOKIE_NAME, "from-server");
        cookie.set_path("/");
        (cookies.add(cookie), "done")
    }

    fn new_test_router() -> Router {
        Router::new()
            .route("/cookie", get(get_cookie))
            .route("/set-cookie", get(get_set_cookie))
    }

    #[test]
    fn it_should_send_cookies_added_to_request() {
        let response_text = new(new_test_router())
            .cookie(TEST_COOKIE_NAME, "my-custom-cookie")
            .get("/cookie")
            .text();

        assert_eq!(response_text, "my-custom-cookie");
    }

    #[test]
    fn it_should_send_the_last_value_for_a_repeated_cookie() {
        let response_text = new(new_test_router())
            .cookie(TEST_COOKIE_NAME, "first")
            .cookie(TEST_COOKIE_NAME, "second")
            .get("/cookie")
            .text();

        assert_eq!(response_text, "second");
    }

    #[test]
    fn it_should_not_send_cookies_by_default() {
        let response_text = new(new_test_router()).get("/cookie").text();

        assert_eq!(response_text, "cookie-not-found");
    }

    #[test]
    fn it_should_parse_cookies_set_by_the_server() {
        let response = new(new_test_router()).get("/set-cookie");

        let cookie = response.cookie(TEST_COOKIE_NAME);
        assert_eq!(cookie.value(), "from-server");
        assert_eq!(cookie.path(), Some("/"));
    }
}
