use ::anyhow::Context;
use ::anyhow::Result;
use ::anyhow::anyhow;
use ::axum::body::Body;
use ::bytes::Bytes;
use ::http::Request;
use ::http::response::Parts;
use ::http_body_util::BodyExt;
use ::std::future::Future;
use ::tokio::runtime::Builder as RuntimeBuilder;
use ::tokio::runtime::Handle;
use ::tokio::runtime::RuntimeFlavor;
use ::tokio::task::block_in_place;

use crate::Handler;

/// Sends the request to the handler, and blocks until the full response is read.
///
/// Panics raised by the handler are not caught.
pub fn dispatch(handler: &dyn Handler, request: Request<Body>) -> Result<(Parts, Bytes)> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    ::tracing::debug!(%method, %uri, "dispatching request");

    let (parts, response_bytes) = block_on(async move {
        let response = handler
            .call(request)
            .await
            .context("Handler failed to produce a response")?;

        let (parts, response_body) = response.into_parts();
        let response_bytes = response_body
            .collect()
            .await
            .context("Reading response body")?
            .to_bytes();

        Ok::<_, anyhow::Error>((parts, response_bytes))
    })??;

    ::tracing::debug!(
        %method,
        %uri,
        status = %parts.status,
        body_len = response_bytes.len(),
        "captured response"
    );

    Ok((parts, response_bytes))
}

/// Drives the future to completion on the calling thread.
///
/// Outside of Tokio this uses a throwaway current thread runtime.
/// Within a multi threaded Tokio runtime it blocks in place.
fn block_on<F>(future: F) -> Result<F::Output>
where
    F: Future,
{
    match Handle::try_current() {
        Ok(handle) => match handle.runtime_flavor() {
            RuntimeFlavor::MultiThread => Ok(block_in_place(|| handle.block_on(future))),
            flavor => Err(anyhow!(
                "cannot block on a {flavor:?} Tokio runtime, use a plain #[test] or #[tokio::test(flavor = \"multi_thread\")]"
            )),
        },
        Err(_) => {
            let runtime = RuntimeBuilder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to build Tokio runtime for dispatch")?;

            Ok(runtime.block_on(future))
        }
    }
}
