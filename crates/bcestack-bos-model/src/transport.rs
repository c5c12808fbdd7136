//! The transport boundary.
//!
//! The client never opens sockets. Every call is handed to a [`Transport`]
//! as a fully signed `http::Request<Body>`; implementations deliver it and
//! return the response. The in-memory BOS service is one implementation.

use std::fmt;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;

use crate::body::Body;

/// Failures below the BOS protocol: delivery and body I/O.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be delivered.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A request could not be assembled from its parts.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Reading or writing a body failed.
    #[error("Body I/O failed: {0}")]
    Body(#[from] io::Error),
}

/// Executes signed requests.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Deliver a request and return the service's response.
    ///
    /// Service-level failures (4xx/5xx) are ordinary responses; only
    /// delivery failures are errors.
    async fn send(&self, request: http::Request<Body>) -> Result<http::Response<Body>, TransportError>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, request: http::Request<Body>) -> Result<http::Response<Body>, TransportError> {
        (**self).send(request).await
    }
}

/// Build a request for an absolute URL, with the `Host` header taken from the
/// URL authority. Used to fetch presigned URLs.
///
/// # Errors
///
/// Returns [`TransportError::InvalidRequest`] if the URL has no authority or
/// cannot be parsed.
///
/// # Examples
///
/// ```
/// use bcestack_bos_model::body::Body;
/// use bcestack_bos_model::transport::request_from_url;
///
/// let req = request_from_url(http::Method::GET, "http://localhost:8080/b/k?x=1", Body::empty())
///     .unwrap();
/// assert_eq!(req.headers()["host"], "localhost:8080");
/// assert_eq!(req.uri().path(), "/b/k");
/// ```
pub fn request_from_url(
    method: http::Method,
    url: &str,
    body: Body,
) -> Result<http::Request<Body>, TransportError> {
    let uri: http::Uri = url
        .parse()
        .map_err(|e: http::uri::InvalidUri| TransportError::InvalidRequest(e.to_string()))?;
    let host = uri
        .authority()
        .map(|authority| authority.as_str().to_owned())
        .ok_or_else(|| TransportError::InvalidRequest(format!("URL has no host: {url}")))?;

    http::Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::HOST, host)
        .body(body)
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct EchoTransport;

    #[async_trait]
    impl Transport for EchoTransport {
        async fn send(
            &self,
            request: http::Request<Body>,
        ) -> Result<http::Response<Body>, TransportError> {
            let (_, body) = request.into_parts();
            Ok(http::Response::new(body))
        }
    }

    #[tokio::test]
    async fn test_should_forward_through_shared_transport() {
        let transport: Arc<dyn Transport> = Arc::new(EchoTransport);
        let request = request_from_url(http::Method::PUT, "http://h/b/k", Body::from("abc")).unwrap();
        let response = transport.send(request).await.unwrap();
        assert_eq!(response.into_body().collect().await.unwrap(), "abc");
    }

    #[test]
    fn test_should_reject_url_without_host() {
        let result = request_from_url(http::Method::GET, "/relative", Body::empty());
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }
}
