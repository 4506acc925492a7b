use ::thiserror::Error;

/// The ways building, sending, or inspecting a request can fail.
///
/// The fluent methods on [`TestRequest`](crate::TestRequest)
/// and [`TestResponse`](crate::TestResponse) panic with the display text of these errors,
/// failing the running test.
/// The `try_*` variants hand them back instead.
#[derive(Debug, Error)]
pub enum HtestError {
    /// The request was configured in a way that cannot be sent.
    /// For example mixing a form body with a JSON body.
    #[error("Invalid request configuration, {0}")]
    Configuration(String),

    /// The path given, or the query string within it, is malformed.
    #[error("Failed to parse request path '{path}', {message}")]
    Parse { path: String, message: String },

    /// A value could not be encoded to JSON, or a JSON response could not be decoded.
    #[error("{message}")]
    Serialization {
        message: String,
        #[source]
        source: ::serde_json::Error,
    },

    /// An expectation against the response did not hold.
    #[error("{0}")]
    Assertion(String),

    /// The handler could not be driven to produce a response.
    #[error("Failed to dispatch request {request}, {source:#}")]
    Dispatch {
        request: String,
        #[source]
        source: ::anyhow::Error,
    },
}

impl HtestError {
    pub(crate) fn configuration<M>(message: M) -> Self
    where
        M: Into<String>,
    {
        Self::Configuration(message.into())
    }

    pub(crate) fn parse<P, M>(path: P, message: M) -> Self
    where
        P: Into<String>,
        M: Into<String>,
    {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Unwraps the result, failing the running test with the error message.
#[track_caller]
pub(crate) fn or_fail<T>(result: Result<T, HtestError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}
