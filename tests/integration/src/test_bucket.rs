//! Bucket integration tests.

#[cfg(test)]
mod tests {
    use bcestack_bos_model::BosErrorCode;
    use bcestack_bos_model::input::{AclSource, PutObjectRequest, SetBucketAclRequest};
    use bcestack_bos_model::types::{CannedAcl, Grant, Grantee, Permission};

    use crate::{bos_client, create_test_bucket, local_service, test_bucket_name};

    #[tokio::test]
    async fn test_should_create_and_delete_bucket() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "create").await;

        assert!(client.does_bucket_exist(&bucket).await.unwrap());
        let location = client.get_bucket_location(&bucket).await.unwrap();
        assert_eq!(location.location_constraint, "bj");

        let err = client.create_bucket(&bucket).await.unwrap_err();
        assert_eq!(err.code, BosErrorCode::BucketAlreadyExists);

        client.delete_bucket(&bucket).await.expect("delete_bucket");
        assert!(!client.does_bucket_exist(&bucket).await.unwrap());

        let err = client.delete_bucket(&bucket).await.unwrap_err();
        assert_eq!(err.code, BosErrorCode::NoSuchBucket);
    }

    #[tokio::test]
    async fn test_should_list_buckets() {
        let service = local_service();
        let client = bos_client(&service);
        let b1 = create_test_bucket(&client, "list1").await;
        let b2 = create_test_bucket(&client, "list2").await;

        let response = client.list_buckets().await.expect("list_buckets");
        let names: Vec<&str> = response.buckets.iter().map(|b| b.name.as_str()).collect();
        assert!(names.contains(&b1.as_str()));
        assert!(names.contains(&b2.as_str()));
        assert_eq!(response.owner.id, service.config().owner_id);
    }

    #[tokio::test]
    async fn test_should_reject_invalid_bucket_name() {
        let service = local_service();
        let client = bos_client(&service);
        for name in ["UPPER-case", "-leading", "ab"] {
            let err = client.create_bucket(name).await.unwrap_err();
            assert_eq!(err.code, BosErrorCode::InvalidBucketName, "{name}");
        }
    }

    #[tokio::test]
    async fn test_should_refuse_to_delete_non_empty_bucket() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "full").await;
        client
            .put_object(PutObjectRequest::new(&bucket, "keep.txt", "x"))
            .await
            .unwrap();

        let err = client.delete_bucket(&bucket).await.unwrap_err();
        assert_eq!(err.code, BosErrorCode::BucketNotEmpty);
        assert!(client.does_bucket_exist(&bucket).await.unwrap());
    }

    #[tokio::test]
    async fn test_should_report_missing_bucket() {
        let service = local_service();
        let client = bos_client(&service);
        let missing = test_bucket_name("missing");

        let err = client
            .put_object(PutObjectRequest::new(&missing, "k", "v"))
            .await
            .unwrap_err();
        assert_eq!(err.code, BosErrorCode::NoSuchBucket);
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_should_set_and_read_bucket_acl() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "acl").await;

        client
            .set_bucket_acl(SetBucketAclRequest {
                bucket: bucket.clone(),
                acl: AclSource::Canned(CannedAcl::PublicRead),
            })
            .await
            .expect("canned ACL");
        let acl = client.get_bucket_acl(&bucket).await.unwrap();
        assert!(acl
            .access_control_list
            .iter()
            .any(|grant| grant.allows(None, Permission::Read)));

        let grants = vec![Grant {
            grantee: vec![Grantee::new("reader")],
            permission: vec![Permission::Read],
        }];
        client
            .set_bucket_acl(SetBucketAclRequest {
                bucket: bucket.clone(),
                acl: AclSource::Grants(grants.clone()),
            })
            .await
            .expect("grant list");
        let acl = client.get_bucket_acl(&bucket).await.unwrap();
        assert_eq!(acl.access_control_list, grants);
    }

    #[tokio::test]
    async fn test_should_reject_malformed_acl_documents() {
        let service = local_service();
        let client = bos_client(&service);
        let bucket = create_test_bucket(&client, "badacl").await;

        for document in ["{}", "{"] {
            let err = client
                .set_bucket_acl(SetBucketAclRequest {
                    bucket: bucket.clone(),
                    acl: AclSource::Json(document.to_owned()),
                })
                .await
                .unwrap_err();
            assert_eq!(err.code, BosErrorCode::MalformedJson, "{document}");
            assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        }

        // The bucket keeps working after the rejected documents.
        client.get_bucket_acl(&bucket).await.expect("get_bucket_acl");
    }
}
