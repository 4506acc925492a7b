use ::anyhow::Error as AnyhowError;
use ::anyhow::Result;
use ::axum::body::Body;
use ::http::Request;
use ::http::Response;
use ::std::future::Future;
use ::std::pin::Pin;
use ::tower::Service;
use ::tower::util::ServiceExt;

/// The application being tested.
///
/// Anything which can take a [`Request`] and produce a [`Response`] in process.
/// This is implemented for every [`tower::Service`] over an Axum [`Body`],
/// which includes [`axum::Router`].
///
/// The request is handed over directly. No socket is opened.
pub trait Handler {
    fn call<'a>(
        &'a self,
        request: Request<Body>,
    ) -> Pin<Box<dyn 'a + Future<Output = Result<Response<Body>>>>>;
}

impl<S> Handler for S
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + 'static,
    S::Future: 'static,
    AnyhowError: From<S::Error>,
{
    fn call<'a>(
        &'a self,
        request: Request<Body>,
    ) -> Pin<Box<dyn 'a + Future<Output = Result<Response<Body>>>>> {
        let service = self.clone();

        Box::pin(async move {
            let response = service.oneshot(request).await?;
            Ok::<_, AnyhowError>(response)
        })
    }
}
