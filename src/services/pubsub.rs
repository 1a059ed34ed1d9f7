//! Pub/Sub v1 - topics and subscriptions.

use std::io::{BufRead, Write};

use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;

use super::{get_optional, require, with_query};
use crate::gcp::client::GcpClient;
use crate::gcp::error::{GcpError, ResourceContext};
use crate::gcp::pager::{fetch_all, CancelFlag, Page};
use crate::prompt::Confirmer;

/// List all topics in the project.
pub async fn list_topics(
    client: &GcpClient,
    cancel: &CancelFlag,
) -> Result<Vec<Value>, GcpError> {
    let base = client.pubsub_url("topics");
    let scope = client.project_id.clone();

    fetch_all(&scope, cancel, |token| {
        let url = with_query(&base, &[("pageToken", token.as_deref())]);
        let scope = scope.clone();
        async move {
            let response = client.get(&url).await.for_resource("topics", &scope)?;
            Ok(Page::from_response(&response, "topics"))
        }
    })
    .await
}

/// Fetch one topic. `Ok(None)` when it does not exist.
pub async fn get_topic(client: &GcpClient, topic_id: &str) -> Result<Option<Value>, GcpError> {
    let url = client.pubsub_url(&format!("topics/{topic_id}"));
    get_optional(client, &url).await
}

/// Create a topic, optionally labeled. Creating an existing topic is a
/// conflict.
pub async fn create_topic(
    client: &GcpClient,
    topic_id: &str,
    labels: &[(String, String)],
) -> Result<Value, GcpError> {
    let url = client.pubsub_url(&format!("topics/{topic_id}"));

    let body = if labels.is_empty() {
        None
    } else {
        let mut map = Map::new();
        for (key, value) in labels {
            map.insert(key.clone(), json!(value));
        }
        Some(json!({ "labels": map }))
    };

    client
        .put(&url, body.as_ref())
        .await
        .for_resource(&format!("topic {topic_id}"), &client.project_id)
}

/// Delete a topic. A topic with attached subscriptions passes through the
/// confirmation gate first. Returns whether the delete was issued.
pub async fn delete_topic_guarded<R: BufRead, W: Write>(
    client: &GcpClient,
    topic_id: &str,
    cancel: &CancelFlag,
    confirmer: &mut Confirmer<R, W>,
) -> Result<bool, GcpError> {
    let attached = list_topic_subscription_names(client, topic_id, cancel).await?;
    if !attached.is_empty() {
        let prompt = format!(
            "Topic {topic_id} in {} has {} subscription(s). Delete it anyway?",
            client.project_id,
            attached.len()
        );
        if !confirmer.confirm(&prompt)? {
            tracing::info!("deletion of topic {} declined", topic_id);
            return Ok(false);
        }
    }

    client
        .delete(&client.pubsub_url(&format!("topics/{topic_id}")))
        .await
        .for_resource(&format!("topic {topic_id}"), &client.project_id)?;
    Ok(true)
}

/// List the full resource names of the subscriptions attached to a topic.
pub async fn list_topic_subscription_names(
    client: &GcpClient,
    topic_id: &str,
    cancel: &CancelFlag,
) -> Result<Vec<String>, GcpError> {
    let base = client.pubsub_url(&format!("topics/{topic_id}/subscriptions"));
    let scope = client.project_id.clone();

    let items = fetch_all(&scope, cancel, |token| {
        let url = with_query(&base, &[("pageToken", token.as_deref())]);
        let resource = format!("topic {topic_id}");
        let scope = scope.clone();
        async move {
            let response = client.get(&url).await.for_resource(&resource, &scope)?;
            Ok(Page::from_response(&response, "subscriptions"))
        }
    })
    .await?;

    Ok(items
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect())
}

/// Resolve every subscription attached to a topic. A subscription that
/// disappears between the listing and its lookup is skipped with a warning;
/// the rest of the listing continues.
pub async fn subscriptions_of_topic(
    client: &GcpClient,
    topic_id: &str,
    cancel: &CancelFlag,
) -> Result<Vec<Value>, GcpError> {
    let names = list_topic_subscription_names(client, topic_id, cancel).await?;
    let mut subscriptions = Vec::with_capacity(names.len());

    for name in names {
        if cancel.is_cancelled() {
            break;
        }
        match get_optional(client, &client.pubsub_resource_url(&name)).await? {
            Some(subscription) => subscriptions.push(subscription),
            None => {
                tracing::warn!(
                    "subscription {} listed under topic {} no longer exists, skipping",
                    name,
                    topic_id
                );
            }
        }
    }

    Ok(subscriptions)
}

/// List all subscriptions in the project.
pub async fn list_subscriptions(
    client: &GcpClient,
    cancel: &CancelFlag,
) -> Result<Vec<Value>, GcpError> {
    let base = client.pubsub_url("subscriptions");
    let scope = client.project_id.clone();

    fetch_all(&scope, cancel, |token| {
        let url = with_query(&base, &[("pageToken", token.as_deref())]);
        let scope = scope.clone();
        async move {
            let response = client
                .get(&url)
                .await
                .for_resource("subscriptions", &scope)?;
            Ok(Page::from_response(&response, "subscriptions"))
        }
    })
    .await
}

/// Fetch one subscription. `Ok(None)` when it does not exist.
pub async fn get_subscription(
    client: &GcpClient,
    subscription_id: &str,
) -> Result<Option<Value>, GcpError> {
    let url = client.pubsub_url(&format!("subscriptions/{subscription_id}"));
    get_optional(client, &url).await
}

/// Create a subscription on `topic_id`. The topic must exist; it is checked
/// against the per-process topic cache before any mutation is issued.
pub async fn create_subscription(
    client: &GcpClient,
    subscription_id: &str,
    topic_id: &str,
    ack_deadline_seconds: Option<u32>,
    topics: &TopicNameCache,
    cancel: &CancelFlag,
) -> Result<Value, GcpError> {
    topics.validate(client, topic_id, cancel).await?;

    let mut body = Map::new();
    body.insert("topic".to_string(), json!(client.topic_name(topic_id)));
    if let Some(seconds) = ack_deadline_seconds {
        body.insert("ackDeadlineSeconds".to_string(), json!(seconds));
    }

    let url = client.pubsub_url(&format!("subscriptions/{subscription_id}"));
    client
        .put(&url, Some(&Value::Object(body)))
        .await
        .for_resource(
            &format!("subscription {subscription_id}"),
            &client.project_id,
        )
}

/// Delete a subscription. Missing subscriptions surface as a structured
/// not-found error.
pub async fn delete_subscription(
    client: &GcpClient,
    subscription_id: &str,
) -> Result<(), GcpError> {
    let url = client.pubsub_url(&format!("subscriptions/{subscription_id}"));
    client
        .delete(&url)
        .await
        .for_resource(
            &format!("subscription {subscription_id}"),
            &client.project_id,
        )?;
    Ok(())
}

/// Describe a subscription or fail with a structured not-found error.
pub async fn describe_subscription(
    client: &GcpClient,
    subscription_id: &str,
) -> Result<Value, GcpError> {
    let found = get_subscription(client, subscription_id).await?;
    require(
        found,
        &format!("subscription {subscription_id}"),
        &client.project_id,
    )
}

/// Per-process cache of the project's topic ids, fetched once on first use
/// and consulted for validating topic-typed inputs. Explicitly constructed
/// and passed by handle; not ambient static state.
#[derive(Default)]
pub struct TopicNameCache {
    names: OnceCell<Vec<String>>,
}

impl TopicNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `topic_id` against the fetched set of topics; the set is loaded
    /// lazily on the first call and reused afterwards.
    pub async fn validate(
        &self,
        client: &GcpClient,
        topic_id: &str,
        cancel: &CancelFlag,
    ) -> Result<(), GcpError> {
        let names = self
            .names
            .get_or_try_init(|| async {
                let topics = list_topics(client, cancel).await?;
                Ok::<_, GcpError>(
                    topics
                        .iter()
                        .filter_map(|t| t.get("name").and_then(|n| n.as_str()))
                        .filter_map(|full| full.rsplit('/').next())
                        .map(str::to_string)
                        .collect(),
                )
            })
            .await?;

        if names.iter().any(|n| n == topic_id) {
            Ok(())
        } else {
            Err(GcpError::InvalidArgument(format!(
                "topic {} does not exist in {} (known topics: {})",
                topic_id,
                client.project_id,
                names.len()
            )))
        }
    }
}
