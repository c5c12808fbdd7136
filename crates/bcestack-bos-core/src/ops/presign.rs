//! Presigned URL generation and fetching.

use bcestack_auth::AuthError;
use bcestack_auth::canonical::{HOST_HEADER, RequestParts};
use bcestack_auth::presigned::PresignedUrlBuilder;
use bcestack_auth::signer::SignOptions;
use bcestack_bos_model::input::GeneratePresignedUrlRequest;
use bcestack_bos_model::transport::request_from_url;
use bcestack_bos_model::{Body, BosError, BosResult};

use crate::client::{BosClient, check_response};

impl BosClient {
    /// Build a URL whose query string alone authorizes `request.method` on
    /// the object until the window closes.
    ///
    /// `host` is always signed; every header in `request.headers` is signed
    /// too and must be sent by whoever fetches the URL.
    ///
    /// # Errors
    ///
    /// - `InvalidCredential` for an anonymous client
    /// - `InvalidExpiration` for a zero-second window
    /// - `ExpirationTooLarge` for more than 7 days
    pub fn generate_presigned_url(&self, request: &GeneratePresignedUrlRequest) -> BosResult<String> {
        let credentials = self.credentials().ok_or_else(|| {
            AuthError::InvalidCredential("presigning requires credentials".to_owned())
        })?;

        let path = if request.key.is_empty() {
            format!("/{}", request.bucket)
        } else {
            format!("/{}/{}", request.bucket, request.key)
        };
        let mut headers = vec![(HOST_HEADER.to_owned(), self.config().host().to_owned())];
        headers.extend(request.headers.iter().cloned());
        let options = SignOptions::new(
            request
                .expiration_seconds
                .unwrap_or(self.config().presign_expiration_seconds),
        )
        .with_headers_to_sign(request.headers.iter().map(|(name, _)| name.clone()));

        let parts = RequestParts {
            method: request.method.as_str(),
            path: &path,
            query: &request.query,
            headers: &headers,
        };
        let presigned = PresignedUrlBuilder::new(credentials, &self.config().endpoint)
            .presign(&parts, &options)?;
        Ok(presigned.url)
    }

    /// Send an unsigned request to an absolute URL, such as a presigned one.
    /// The `Host` header comes from the URL; `headers` are added as given.
    ///
    /// # Errors
    ///
    /// Returns `TransportFailure` for an unusable URL, or any service error.
    pub async fn send_presigned(
        &self,
        method: http::Method,
        url: &str,
        headers: &[(String, String)],
        body: Body,
    ) -> BosResult<http::Response<Body>> {
        let mut request = request_from_url(method, url, body)?;
        for (name, value) in headers {
            let name = http::header::HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                BosError::invalid_argument(format!("Invalid header name {name}"))
                    .with_source(e)
            })?;
            let value = http::HeaderValue::from_str(value).map_err(|e| {
                BosError::invalid_argument("Invalid header value").with_source(e)
            })?;
            request.headers_mut().insert(name, value);
        }
        if let Some(length) = request.body().size_hint() {
            request
                .headers_mut()
                .insert(http::header::CONTENT_LENGTH, http::HeaderValue::from(length));
        }
        let resource = Some(request.uri().path().to_owned());
        let response = self.transport().send(request).await?;
        check_response(response, resource).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bcestack_auth::StaticCredentialProvider;
    use bcestack_auth::canonical::{parse_query_string, uri_decode};
    use bcestack_auth::presigned::verify_presigned;
    use bcestack_bos_model::BosErrorCode;

    use crate::client::tests::{ScriptedTransport, client_with};
    use crate::config::BosClientConfig;

    use super::*;

    #[test]
    fn test_should_generate_verifiable_url() {
        let transport = Arc::new(ScriptedTransport::default());
        let client = client_with(&transport);
        let url = client
            .generate_presigned_url(&GeneratePresignedUrlRequest::get("bucket", "a b.txt").with_expiration(60))
            .unwrap();
        assert!(url.starts_with("http://bos.test/bucket/a%20b.txt?"));

        let uri: http::Uri = url.parse().unwrap();
        let query = parse_query_string(uri.query().unwrap());
        let path = uri_decode(uri.path());
        let headers = vec![("host".to_owned(), "bos.test".to_owned())];
        let provider = StaticCredentialProvider::new(vec![("ak".to_owned(), "sk".to_owned())]);
        let result = verify_presigned(
            &RequestParts {
                method: "GET",
                path: &path,
                query: &query,
                headers: &headers,
            },
            &provider,
        )
        .unwrap();
        assert_eq!(result.expiration_seconds, 60);
    }

    #[test]
    fn test_should_use_configured_default_expiration() {
        let transport = Arc::new(ScriptedTransport::default());
        let client = client_with(&transport);
        let url = client
            .generate_presigned_url(&GeneratePresignedUrlRequest::get("b", "k"))
            .unwrap();
        assert!(url.contains("x-bce-expires=1800"));
    }

    #[test]
    fn test_should_reject_bad_expirations() {
        let transport = Arc::new(ScriptedTransport::default());
        let client = client_with(&transport);
        let err = client
            .generate_presigned_url(&GeneratePresignedUrlRequest::get("b", "k").with_expiration(0))
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::InvalidExpiration);
        let err = client
            .generate_presigned_url(
                &GeneratePresignedUrlRequest::get("b", "k").with_expiration(7 * 24 * 3600 + 1),
            )
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::ExpirationTooLarge);
    }

    #[test]
    fn test_should_require_credentials_to_presign() {
        let transport = Arc::new(ScriptedTransport::default());
        let client = BosClient::new(BosClientConfig::default(), transport);
        let err = client
            .generate_presigned_url(&GeneratePresignedUrlRequest::get("b", "k"))
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::InvalidCredential);
    }

    #[tokio::test]
    async fn test_should_fetch_presigned_url_without_signing() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.respond(200, &[], "payload");
        let client = client_with(&transport);
        let url = client
            .generate_presigned_url(&GeneratePresignedUrlRequest::get("b", "k"))
            .unwrap();

        let response = client
            .send_presigned(http::Method::GET, &url, &[], Body::empty())
            .await
            .unwrap();
        assert_eq!(response.into_body().collect().await.unwrap(), "payload");
        let sent = transport.last_request();
        assert!(sent.headers.get("authorization").is_none());
        assert_eq!(sent.headers["host"], "bos.test");
    }
}
