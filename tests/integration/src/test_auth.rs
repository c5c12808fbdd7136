//! Authentication and anonymous access integration tests.

#[cfg(test)]
mod tests {
    use bcestack_bos_local::{LocalBos, LocalBosConfig};
    use bcestack_bos_model::BosErrorCode;
    use bcestack_bos_model::input::{AclSource, PutObjectRequest, SetBucketAclRequest};
    use bcestack_bos_model::types::CannedAcl;

    use crate::{anonymous_client, bos_client, client_with_secret, create_test_bucket, local_service};

    #[tokio::test]
    async fn test_should_reject_wrong_secret_key() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "auth").await;

        let impostor = client_with_secret(&service, "not-the-secret");
        let err = impostor
            .put_object(PutObjectRequest::new(&bucket, "k.txt", "v"))
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::AuthenticationFailed);
        assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);

        let err = impostor.list_buckets().await.unwrap_err();
        assert_eq!(err.code, BosErrorCode::AuthenticationFailed);

        let err = client.get_object_content(&bucket, "k.txt").await.unwrap_err();
        assert_eq!(err.code, BosErrorCode::NoSuchKey);
    }

    #[tokio::test]
    async fn test_should_reject_unknown_access_key() {
        // A service that knows no keys at all.
        let stranger = LocalBos::new(LocalBosConfig::default());
        let err = bos_client(&stranger).list_buckets().await.unwrap_err();
        assert_eq!(err.code, BosErrorCode::AuthenticationFailed);
    }

    #[tokio::test]
    async fn test_should_allow_anonymous_access_through_public_acl() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "public").await;
        let anonymous = anonymous_client(&service);
        assert!(anonymous.is_anonymous());

        let err = anonymous
            .put_object(PutObjectRequest::new(&bucket, "anon.txt", "hi"))
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::AccessDenied);

        client
            .set_bucket_acl(SetBucketAclRequest {
                bucket: bucket.clone(),
                acl: AclSource::Canned(CannedAcl::PublicReadWrite),
            })
            .await
            .unwrap();

        anonymous
            .put_object(PutObjectRequest::new(&bucket, "anon.txt", "hi"))
            .await
            .expect("anonymous put");
        let body = anonymous
            .get_object_content(&bucket, "anon.txt")
            .await
            .expect("anonymous get");
        assert_eq!(&body[..], b"hi");

        let session = anonymous
            .start_upload_session(&bucket, "anon.bin", Default::default())
            .await
            .expect("anonymous multipart");
        session.upload_part(&anonymous, 1, vec![1u8; 3]).await.unwrap();
        session
            .complete(&anonymous, session.part_etags(), Default::default())
            .await
            .expect("anonymous complete");

        // Account-level operations stay closed to anonymous callers.
        let err = anonymous.list_buckets().await.unwrap_err();
        assert_eq!(err.code, BosErrorCode::AccessDenied);
        let err = anonymous.get_bucket_acl(&bucket).await.unwrap_err();
        assert_eq!(err.code, BosErrorCode::AccessDenied);
    }

    #[tokio::test]
    async fn test_should_keep_public_read_bucket_read_only() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "readonly").await;
        client
            .put_object(PutObjectRequest::new(&bucket, "doc.txt", "read me"))
            .await
            .unwrap();
        client
            .set_bucket_acl(SetBucketAclRequest {
                bucket: bucket.clone(),
                acl: AclSource::Canned(CannedAcl::PublicRead),
            })
            .await
            .unwrap();

        let anonymous = anonymous_client(&service);
        let body = anonymous.get_object_content(&bucket, "doc.txt").await.unwrap();
        assert_eq!(&body[..], b"read me");

        let err = anonymous
            .put_object(PutObjectRequest::new(&bucket, "doc.txt", "overwrite"))
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::AccessDenied);
    }
}
