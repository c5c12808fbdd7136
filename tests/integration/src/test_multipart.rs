//! Multipart upload integration tests.

#[cfg(test)]
mod tests {
    use bcestack_bos_core::UploadStatus;
    use bcestack_bos_local::{LocalBos, LocalBosConfig};
    use bcestack_bos_model::checksum::md5_hex;
    use bcestack_bos_model::input::{
        GetObjectMetadataRequest, ListMultipartUploadsRequest, ListPartsRequest, UploadPartRequest,
    };
    use bcestack_bos_model::{BosErrorCode, ObjectMetadata, PartETag};
    use bytes::Bytes;
    use futures::future::try_join_all;

    use crate::{ACCESS_KEY_ID, SECRET_ACCESS_KEY, bos_client, create_test_bucket, local_service};

    #[tokio::test]
    async fn test_should_list_parts_ascending_after_reverse_upload() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "mpu").await;
        let session = client
            .start_upload_session(&bucket, "reverse.bin", ObjectMetadata::default())
            .await
            .expect("start_upload_session");

        for n in (1..=10u32).rev() {
            session
                .upload_part(&client, n, vec![b'0' + u8::try_from(n % 10).unwrap()])
                .await
                .unwrap_or_else(|e| panic!("upload part {n}: {e}"));
        }
        assert_eq!(session.status(), UploadStatus::PartsUploading);

        let local = session.list_parts(None, None);
        let numbers: Vec<u32> = local.parts.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, (1..=10).collect::<Vec<_>>());

        let remote = client
            .list_parts(ListPartsRequest {
                bucket: bucket.clone(),
                key: "reverse.bin".to_owned(),
                upload_id: session.upload_id().to_owned(),
                part_number_marker: None,
                max_parts: None,
            })
            .await
            .expect("list_parts");
        assert_eq!(remote.parts.len(), 10);
        for (n, part) in (1..=10u32).zip(&remote.parts) {
            assert_eq!(part.part_number, n);
            assert_eq!(part.size, 1);
            assert_eq!(part.e_tag, md5_hex(&[b'0' + u8::try_from(n % 10).unwrap()]));
        }
        assert!(!remote.is_truncated);

        let page = client
            .list_parts(ListPartsRequest {
                bucket: bucket.clone(),
                key: "reverse.bin".to_owned(),
                upload_id: session.upload_id().to_owned(),
                part_number_marker: Some(3),
                max_parts: Some(4),
            })
            .await
            .expect("paged list_parts");
        let numbers: Vec<u32> = page.parts.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![4, 5, 6, 7]);
        assert!(page.is_truncated);
        assert_eq!(page.next_part_number_marker, 7);
    }

    #[tokio::test]
    async fn test_should_assemble_concurrently_uploaded_parts() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "mpu").await;
        let session = client
            .start_upload_session(&bucket, "joined.txt", ObjectMetadata::default())
            .await
            .unwrap();

        let chunks = ["alpha-", "beta-", "gamma"];
        try_join_all(
            chunks
                .iter()
                .zip(1u32..)
                .map(|(chunk, n)| session.upload_part(&client, n, Bytes::from_static(chunk.as_bytes()))),
        )
        .await
        .expect("concurrent upload_part");

        let response = session
            .complete(&client, session.part_etags(), ObjectMetadata::default())
            .await
            .expect("complete");
        assert!(response.e_tag.ends_with("-3"));
        assert_eq!(session.status(), UploadStatus::Completed);

        let body = client.get_object_content(&bucket, "joined.txt").await.unwrap();
        assert_eq!(&body[..], b"alpha-beta-gamma");
    }

    #[tokio::test]
    async fn test_should_reject_missing_part_and_second_completion() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "mpu").await;
        let session = client
            .start_upload_session(&bucket, "strict.bin", ObjectMetadata::default())
            .await
            .unwrap();

        let err = session
            .complete(&client, Vec::new(), ObjectMetadata::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::InvalidSessionState);

        for n in 1..=3u32 {
            session.upload_part(&client, n, vec![0u8; 2]).await.unwrap();
        }
        let mut part_etags = session.part_etags();
        part_etags.pop();
        let err = session
            .complete(&client, part_etags, ObjectMetadata::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::InvalidPart);
        assert_eq!(session.status(), UploadStatus::PartsUploading);

        session
            .complete(&client, session.part_etags(), ObjectMetadata::default())
            .await
            .expect("complete");
        let err = session
            .complete(&client, session.part_etags(), ObjectMetadata::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::InvalidSessionState);

        let err = session.upload_part(&client, 4, vec![0u8]).await.unwrap_err();
        assert_eq!(err.code, BosErrorCode::NoSuchUpload);

        let err = client
            .upload_part(UploadPartRequest {
                bucket: bucket.clone(),
                key: "strict.bin".to_owned(),
                upload_id: session.upload_id().to_owned(),
                part_number: 4,
                data: Bytes::from_static(b"late"),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::NoSuchUpload);
    }

    #[tokio::test]
    async fn test_should_enforce_minimum_part_size_on_service() {
        let config = LocalBosConfig::builder().min_part_size(4).build();
        let service = LocalBos::new(config).with_credential(ACCESS_KEY_ID, SECRET_ACCESS_KEY);
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "small").await;
        let session = client
            .start_upload_session(&bucket, "small.bin", ObjectMetadata::default())
            .await
            .unwrap();
        session.upload_part(&client, 1, vec![1u8; 2]).await.unwrap();
        session.upload_part(&client, 2, vec![2u8; 2]).await.unwrap();

        let err = session
            .complete(&client, session.part_etags(), ObjectMetadata::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::EntityTooSmall);
        assert_eq!(session.status(), UploadStatus::PartsUploading);
    }

    #[tokio::test]
    async fn test_should_drop_aborted_upload_from_listing() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "abort").await;
        let kept = client
            .start_upload_session(&bucket, "kept.bin", ObjectMetadata::default())
            .await
            .unwrap();
        let aborted = client
            .start_upload_session(&bucket, "aborted.bin", ObjectMetadata::default())
            .await
            .unwrap();
        aborted.upload_part(&client, 1, vec![7u8; 3]).await.unwrap();

        let list = || ListMultipartUploadsRequest {
            bucket: bucket.clone(),
            ..ListMultipartUploadsRequest::default()
        };
        let before = client.list_multipart_uploads(list()).await.unwrap();
        assert_eq!(before.uploads.len(), 2);

        aborted.abort(&client).await.expect("abort");
        assert_eq!(aborted.status(), UploadStatus::Aborted);
        assert_eq!(aborted.part_count(), 0);

        let after = client.list_multipart_uploads(list()).await.unwrap();
        let ids: Vec<&str> = after.uploads.iter().map(|u| u.upload_id.as_str()).collect();
        assert_eq!(ids, vec![kept.upload_id()]);

        let err = aborted.abort(&client).await.unwrap_err();
        assert_eq!(err.code, BosErrorCode::InvalidSessionState);
    }

    #[tokio::test]
    async fn test_should_page_through_uploads_sharing_a_key() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "paging").await;
        let mut expected = Vec::new();
        for _ in 0..3 {
            let session = client
                .start_upload_session(&bucket, "shared.bin", ObjectMetadata::default())
                .await
                .unwrap();
            expected.push(session.upload_id().to_owned());
        }
        expected.sort();

        let mut seen = Vec::new();
        let mut request = ListMultipartUploadsRequest {
            bucket: bucket.clone(),
            max_uploads: Some(1),
            ..ListMultipartUploadsRequest::default()
        };
        loop {
            let page = client.list_multipart_uploads(request.clone()).await.unwrap();
            assert!(page.uploads.len() <= 1);
            seen.extend(page.uploads.into_iter().map(|u| u.upload_id));
            if !page.is_truncated {
                break;
            }
            request.key_marker = page.next_key_marker;
            request.upload_id_marker = page.next_upload_id_marker;
        }
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_should_merge_completion_metadata_into_initiation_metadata() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "meta").await;
        let session = client
            .start_upload_session(
                &bucket,
                "merged.bin",
                ObjectMetadata::with_content_type("text/plain").with_user_metadata("a", "init"),
            )
            .await
            .unwrap();
        session.upload_part(&client, 1, vec![b'x'; 4]).await.unwrap();

        session
            .complete(
                &client,
                session.part_etags(),
                ObjectMetadata::with_content_type("image/png")
                    .with_user_metadata("a", "late")
                    .with_user_metadata("b", "late"),
            )
            .await
            .expect("complete");

        let completed = session.completed().expect("completed upload");
        assert_eq!(completed.metadata.content_type.as_deref(), Some("text/plain"));
        assert_eq!(completed.metadata.user_metadata["a"], "init");
        assert_eq!(completed.metadata.user_metadata["b"], "late");

        let stored = client
            .get_object_metadata(GetObjectMetadataRequest {
                bucket: bucket.clone(),
                key: "merged.bin".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(stored.metadata.content_type.as_deref(), Some("text/plain"));
        assert_eq!(stored.metadata.user_metadata["a"], "init");
        assert_eq!(stored.metadata.user_metadata["b"], "late");
        assert_eq!(stored.metadata.e_tag.as_deref(), Some(completed.e_tag.as_str()));
    }

    #[tokio::test]
    async fn test_should_resume_upload_from_service_listing() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "resume").await;
        let original = client
            .start_upload_session(&bucket, "resumed.bin", ObjectMetadata::default())
            .await
            .unwrap();
        for n in 1..=3u32 {
            original.upload_part(&client, n, vec![b'r'; 2]).await.unwrap();
        }

        let resumed = client
            .resume_multipart_upload(&bucket, "resumed.bin", original.upload_id())
            .await
            .expect("resume");
        assert_eq!(resumed.part_count(), 3);
        assert_eq!(resumed.status(), UploadStatus::PartsUploading);
        assert_eq!(
            resumed.part_etags(),
            (1..=3).map(|n| PartETag::new(n, md5_hex(b"rr"))).collect::<Vec<_>>()
        );

        resumed
            .complete(&client, resumed.part_etags(), ObjectMetadata::default())
            .await
            .expect("complete resumed");
        let body = client.get_object_content(&bucket, "resumed.bin").await.unwrap();
        assert_eq!(&body[..], b"rrrrrr");

        let err = client
            .resume_multipart_upload(&bucket, "resumed.bin", original.upload_id())
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::NoSuchUpload);
    }
}
