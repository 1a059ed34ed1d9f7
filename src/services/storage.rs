//! Cloud Storage v1 - buckets and objects.

use std::io::{BufRead, Write};

use serde_json::Value;

use super::{get_optional, with_query};
use crate::gcp::client::GcpClient;
use crate::gcp::error::{GcpError, ResourceContext};
use crate::gcp::pager::{fetch_all, CancelFlag, Page};
use crate::prompt::Confirmer;

/// List the buckets of the project, optionally restricted to a name prefix.
pub async fn list_buckets(
    client: &GcpClient,
    prefix: Option<&str>,
    cancel: &CancelFlag,
) -> Result<Vec<Value>, GcpError> {
    let base = with_query(
        &client.storage_url("b"),
        &[("project", Some(client.project_id.as_str()))],
    );
    let scope = client.project_id.clone();

    fetch_all(&scope, cancel, |token| {
        let url = with_query(&base, &[("prefix", prefix), ("pageToken", token.as_deref())]);
        let scope = scope.clone();
        async move {
            let response = client.get(&url).await.for_resource("buckets", &scope)?;
            Ok(Page::from_response(&response, "items"))
        }
    })
    .await
}

/// Fetch one bucket. `Ok(None)` when it does not exist.
pub async fn get_bucket(client: &GcpClient, bucket: &str) -> Result<Option<Value>, GcpError> {
    get_optional(client, &client.storage_bucket_url(bucket)).await
}

/// List the objects of a bucket, optionally restricted to a name prefix.
pub async fn list_objects(
    client: &GcpClient,
    bucket: &str,
    prefix: Option<&str>,
    cancel: &CancelFlag,
) -> Result<Vec<Value>, GcpError> {
    let base = client.storage_objects_url(bucket);
    let scope = format!("{}/{}", client.project_id, bucket);

    fetch_all(&scope, cancel, |token| {
        let url = with_query(&base, &[("prefix", prefix), ("pageToken", token.as_deref())]);
        let resource = format!("bucket {bucket}");
        async move {
            let response = client
                .get(&url)
                .await
                .for_resource(&resource, &client.project_id)?;
            Ok(Page::from_response(&response, "items"))
        }
    })
    .await
}

/// Fetch one object's metadata. `Ok(None)` when it does not exist.
pub async fn get_object(
    client: &GcpClient,
    bucket: &str,
    object: &str,
) -> Result<Option<Value>, GcpError> {
    let url = format!(
        "{}/{}",
        client.storage_objects_url(bucket),
        urlencoding::encode(object)
    );
    get_optional(client, &url).await
}

/// Delete one object.
pub async fn delete_object(client: &GcpClient, bucket: &str, object: &str) -> Result<(), GcpError> {
    let url = format!(
        "{}/{}",
        client.storage_objects_url(bucket),
        urlencoding::encode(object)
    );
    client
        .delete(&url)
        .await
        .for_resource(&format!("object {bucket}/{object}"), &client.project_id)?;
    Ok(())
}

/// Whether the bucket currently holds any objects. Asks for a single item;
/// a missing items field denotes an empty bucket.
pub async fn bucket_is_empty(client: &GcpClient, bucket: &str) -> Result<bool, GcpError> {
    let url = with_query(
        &client.storage_objects_url(bucket),
        &[("maxResults", Some("1"))],
    );
    let response = client
        .get(&url)
        .await
        .for_resource(&format!("bucket {bucket}"), &client.project_id)?;
    Ok(Page::from_response(&response, "items").items.is_empty())
}

/// Delete a bucket. A non-empty bucket passes through the confirmation gate;
/// accepting removes the remaining objects first (the API refuses to delete
/// a non-empty bucket). Returns whether the bucket delete was issued.
pub async fn delete_bucket_guarded<R: BufRead, W: Write>(
    client: &GcpClient,
    bucket: &str,
    cancel: &CancelFlag,
    confirmer: &mut Confirmer<R, W>,
) -> Result<bool, GcpError> {
    if !bucket_is_empty(client, bucket).await? {
        let prompt = format!(
            "Bucket {bucket} in {} is not empty. Delete it and all its objects?",
            client.project_id
        );
        if !confirmer.confirm(&prompt)? {
            tracing::info!("deletion of bucket {} declined", bucket);
            return Ok(false);
        }

        for object in list_objects(client, bucket, None, cancel).await? {
            let Some(name) = object.get("name").and_then(|n| n.as_str()) else {
                continue;
            };
            delete_object(client, bucket, name).await?;
        }
    }

    client
        .delete(&client.storage_bucket_url(bucket))
        .await
        .for_resource(&format!("bucket {bucket}"), &client.project_id)?;
    Ok(true)
}
