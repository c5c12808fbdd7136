//! Presigned URL integration tests.

#[cfg(test)]
mod tests {
    use bcestack_bos_model::input::{GeneratePresignedUrlRequest, PutObjectRequest};
    use bcestack_bos_model::{Body, BosErrorCode};
    use chrono::TimeDelta;

    use crate::{anonymous_client, bos_client, create_test_bucket, local_service};

    #[tokio::test]
    async fn test_should_fetch_object_through_presigned_url() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "presign").await;
        client
            .put_object(PutObjectRequest::new(&bucket, "lines.txt", "value1\nvalue2"))
            .await
            .expect("put_object");

        let url = client
            .generate_presigned_url(&GeneratePresignedUrlRequest::get(&bucket, "lines.txt"))
            .expect("generate_presigned_url");
        assert!(url.contains("x-bce-signature="), "{url}");

        // The bucket is private: only the URL's signature lets this through.
        let fetcher = anonymous_client(&service);
        let response = fetcher
            .send_presigned(http::Method::GET, &url, &[], Body::empty())
            .await
            .expect("fetch presigned URL");
        let body = response.into_body().collect().await.unwrap();
        assert_eq!(&body[..], b"value1\nvalue2");

        let err = fetcher
            .get_object_content(&bucket, "lines.txt")
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::AccessDenied);
    }

    #[tokio::test]
    async fn test_should_reject_presigned_url_outside_its_window() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "expiry").await;
        client
            .put_object(PutObjectRequest::new(&bucket, "short-lived.txt", "soon gone"))
            .await
            .unwrap();
        let url = client
            .generate_presigned_url(
                &GeneratePresignedUrlRequest::get(&bucket, "short-lived.txt").with_expiration(60),
            )
            .unwrap();

        service.advance_clock(TimeDelta::seconds(30));
        client
            .send_presigned(http::Method::GET, &url, &[], Body::empty())
            .await
            .expect("still valid");

        service.advance_clock(TimeDelta::seconds(60));
        let err = client
            .send_presigned(http::Method::GET, &url, &[], Body::empty())
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::AuthenticationFailed);
        assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_should_reject_presigned_url_for_another_key() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "tamper").await;
        for key in ["granted.txt", "other.txt"] {
            client
                .put_object(PutObjectRequest::new(&bucket, key, "secret"))
                .await
                .unwrap();
        }
        let url = client
            .generate_presigned_url(&GeneratePresignedUrlRequest::get(&bucket, "granted.txt"))
            .unwrap();

        let tampered = url.replace("/granted.txt", "/other.txt");
        let err = client
            .send_presigned(http::Method::GET, &tampered, &[], Body::empty())
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::AuthenticationFailed);
    }

    #[tokio::test]
    async fn test_should_presign_keys_with_spaces() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "space").await;
        client
            .put_object(PutObjectRequest::new(&bucket, "my file 100%.txt", "spaced"))
            .await
            .unwrap();

        let url = client
            .generate_presigned_url(&GeneratePresignedUrlRequest::get(&bucket, "my file 100%.txt"))
            .unwrap();
        assert!(url.contains("/my%20file%20100%25.txt?"), "{url}");
        let response = client
            .send_presigned(http::Method::GET, &url, &[], Body::empty())
            .await
            .unwrap();
        assert_eq!(&response.into_body().collect().await.unwrap()[..], b"spaced");
    }

    #[tokio::test]
    async fn test_should_refuse_to_presign_without_credentials() {
        let service = local_service();
        let err = anonymous_client(&service)
            .generate_presigned_url(&GeneratePresignedUrlRequest::get("bucket", "key"))
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::InvalidCredential);
    }
}
