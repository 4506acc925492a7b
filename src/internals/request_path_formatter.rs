use ::http::Method;
use ::std::fmt;

/// Formats a request as `METHOD /path`, for use in error messages.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPathFormatter<'a> {
    method: &'a Method,

    /// This is the path that the user requested.
    user_requested_path: &'a str,
}

impl<'a> RequestPathFormatter<'a> {
    pub fn new(method: &'a Method, user_requested_path: &'a str) -> Self {
        Self {
            method,
            user_requested_path,
        }
    }
}

impl fmt::Display for RequestPathFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = self.method;
        let user_requested_path = self.user_requested_path;

        write!(f, "{method} {user_requested_path}")
    }
}
