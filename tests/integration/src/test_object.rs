//! Object integration tests.

#[cfg(test)]
mod tests {
    use bcestack_bos_model::checksum::md5_hex;
    use bcestack_bos_model::input::{
        CopyObjectRequest, DeleteObjectRequest, GetObjectMetadataRequest, GetObjectRequest,
        PutObjectRequest,
    };
    use bcestack_bos_model::{BosErrorCode, ObjectMetadata};

    use crate::{bos_client, create_test_bucket, local_service};

    #[tokio::test]
    async fn test_should_put_and_get_object() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "obj").await;

        let put = client
            .put_object(PutObjectRequest::new(&bucket, "hello.txt", "Hello, BOS!"))
            .await
            .expect("put_object");
        assert_eq!(put.e_tag, md5_hex(b"Hello, BOS!"));

        let body = client
            .get_object_content(&bucket, "hello.txt")
            .await
            .expect("get_object_content");
        assert_eq!(&body[..], b"Hello, BOS!");

        let head = client
            .get_object_metadata(GetObjectMetadataRequest {
                bucket: bucket.clone(),
                key: "hello.txt".to_owned(),
            })
            .await
            .expect("get_object_metadata");
        assert_eq!(head.metadata.content_length, Some(11));
        assert_eq!(head.metadata.content_type.as_deref(), Some("text/plain"));
        assert_eq!(head.metadata.e_tag.as_deref(), Some(put.e_tag.as_str()));
    }

    #[tokio::test]
    async fn test_should_read_byte_range() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "range").await;
        client
            .put_object(PutObjectRequest::new(&bucket, "data", "data"))
            .await
            .expect("put_object");

        let ranged = client
            .get_object(GetObjectRequest::new(&bucket, "data").with_range(0, 0))
            .await
            .expect("ranged get");
        assert_eq!(ranged.content_range.as_deref(), Some("bytes 0-0/4"));
        assert_eq!(&ranged.body.collect().await.unwrap()[..], b"d");

        let whole = client
            .get_object(GetObjectRequest::new(&bucket, "data"))
            .await
            .expect("get");
        assert!(whole.content_range.is_none());
        assert_eq!(&whole.body.collect().await.unwrap()[..], b"data");

        let err = client
            .get_object(GetObjectRequest::new(&bucket, "data").with_range(10, 20))
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::InvalidRange);
    }

    #[tokio::test]
    async fn test_should_truncate_to_declared_length() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "len").await;

        let metadata = ObjectMetadata {
            content_length: Some(5),
            ..ObjectMetadata::default()
        };
        client
            .put_object(
                PutObjectRequest::new(&bucket, "short.bin", "0123456789").with_metadata(metadata),
            )
            .await
            .expect("put_object");

        let body = client.get_object_content(&bucket, "short.bin").await.unwrap();
        assert_eq!(&body[..], b"01234");
    }

    #[tokio::test]
    async fn test_should_round_trip_keys_with_reserved_characters() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "keys").await;

        for key in ["100% done.txt", "dir/sub dir/a+b=c.txt", "测试/文件.txt"] {
            client
                .put_object(PutObjectRequest::new(&bucket, key, key.to_owned()))
                .await
                .unwrap_or_else(|e| panic!("put {key}: {e}"));
            let body = client.get_object_content(&bucket, key).await.unwrap();
            assert_eq!(&body[..], key.as_bytes());
        }
    }

    #[tokio::test]
    async fn test_should_copy_with_and_without_new_metadata() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "copy").await;
        let metadata = ObjectMetadata::with_content_type("text/plain").with_user_metadata("color", "blue");
        let put = client
            .put_object(PutObjectRequest::new(&bucket, "src.txt", "payload").with_metadata(metadata))
            .await
            .unwrap();

        let copied = client
            .copy_object(CopyObjectRequest {
                source_bucket: bucket.clone(),
                source_key: "src.txt".to_owned(),
                target_bucket: bucket.clone(),
                target_key: "same.txt".to_owned(),
                new_metadata: None,
            })
            .await
            .expect("copy");
        assert_eq!(copied.e_tag, put.e_tag);

        let same = client
            .get_object_metadata(GetObjectMetadataRequest {
                bucket: bucket.clone(),
                key: "same.txt".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(same.metadata.user_metadata["color"], "blue");

        client
            .copy_object(CopyObjectRequest {
                source_bucket: bucket.clone(),
                source_key: "src.txt".to_owned(),
                target_bucket: bucket.clone(),
                target_key: "replaced.txt".to_owned(),
                new_metadata: Some(ObjectMetadata::default().with_user_metadata("shape", "round")),
            })
            .await
            .expect("copy with replace");

        let replaced = client
            .get_object_metadata(GetObjectMetadataRequest {
                bucket: bucket.clone(),
                key: "replaced.txt".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(replaced.metadata.user_metadata.get("shape").map(String::as_str), Some("round"));
        assert!(!replaced.metadata.user_metadata.contains_key("color"));
        assert_eq!(replaced.metadata.content_type.as_deref(), Some("text/plain"));
        let body = client.get_object_content(&bucket, "replaced.txt").await.unwrap();
        assert_eq!(&body[..], b"payload");
    }

    #[tokio::test]
    async fn test_should_default_content_type_from_extension() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "mime").await;

        for (key, expected) in [
            ("image.png", "image/png"),
            ("grammar.gram", "application/srgs"),
            ("no-extension", "application/octet-stream"),
        ] {
            client
                .put_object(PutObjectRequest::new(&bucket, key, "x"))
                .await
                .unwrap();
            let head = client
                .get_object_metadata(GetObjectMetadataRequest {
                    bucket: bucket.clone(),
                    key: key.to_owned(),
                })
                .await
                .unwrap();
            assert_eq!(head.metadata.content_type.as_deref(), Some(expected), "{key}");
        }
    }

    #[tokio::test]
    async fn test_should_report_missing_object_after_delete() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "del").await;
        client
            .put_object(PutObjectRequest::new(&bucket, "gone.txt", "bye"))
            .await
            .unwrap();

        let delete = || DeleteObjectRequest {
            bucket: bucket.clone(),
            key: "gone.txt".to_owned(),
        };
        client.delete_object(delete()).await.expect("delete");

        let err = client.get_object_content(&bucket, "gone.txt").await.unwrap_err();
        assert_eq!(err.code, BosErrorCode::NoSuchKey);
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
        assert!(err.request_id.is_some());

        let err = client.delete_object(delete()).await.unwrap_err();
        assert_eq!(err.code, BosErrorCode::NoSuchKey);
    }
}
