//! Pub/Sub subcommands.

use anyhow::Result;
use clap::Subcommand;

use super::CommandContext;
use crate::gcp::error::GcpError;
use crate::output::{col, print_items, print_value, Column};
use crate::prompt::Confirmer;
use crate::services::pubsub::{self, TopicNameCache};
use crate::services::require;

const TOPIC_COLUMNS: &[Column] = &[col("TOPIC", "name")];

const SUBSCRIPTION_COLUMNS: &[Column] = &[
    col("SUBSCRIPTION", "name"),
    col("TOPIC", "topic"),
    col("ACK DEADLINE", "ackDeadlineSeconds"),
];

#[derive(Subcommand, Debug)]
pub enum PubsubCommand {
    /// List topics in the project
    ListTopics,
    /// Show a single topic
    DescribeTopic { topic: String },
    /// Create a topic
    CreateTopic {
        topic: String,
        /// Labels as key=value pairs, repeatable
        #[arg(long = "label", value_parser = parse_label)]
        labels: Vec<(String, String)>,
    },
    /// Delete a topic. Prompts when subscriptions are still attached
    DeleteTopic {
        topic: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// List subscriptions, either all of them or those attached to a topic
    ListSubscriptions {
        /// Restrict to subscriptions of this topic
        #[arg(long)]
        topic: Option<String>,
    },
    /// Show a single subscription
    DescribeSubscription { subscription: String },
    /// Create a subscription on an existing topic
    CreateSubscription {
        subscription: String,
        #[arg(long)]
        topic: String,
        /// Acknowledgement deadline in seconds (10-600)
        #[arg(long)]
        ack_deadline: Option<u32>,
    },
    /// Delete a subscription
    DeleteSubscription { subscription: String },
}

/// Parse a `key=value` label argument.
fn parse_label(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{input}'")),
    }
}

pub async fn run(command: PubsubCommand, ctx: &CommandContext) -> Result<()> {
    match command {
        PubsubCommand::ListTopics => {
            let topics = pubsub::list_topics(&ctx.client, &ctx.cancel).await?;
            print_items(&topics, TOPIC_COLUMNS, ctx.format);
        }
        PubsubCommand::DescribeTopic { topic } => {
            let found = pubsub::get_topic(&ctx.client, &topic).await?;
            let topic = require(found, &format!("topic {topic}"), &ctx.client.project_id)?;
            print_value(&topic, ctx.format);
        }
        PubsubCommand::CreateTopic { topic, labels } => {
            let created = pubsub::create_topic(&ctx.client, &topic, &labels).await?;
            print_value(&created, ctx.format);
        }
        PubsubCommand::DeleteTopic { topic, force } => {
            let mut confirmer = Confirmer::from_terminal(force);
            if pubsub::delete_topic_guarded(&ctx.client, &topic, &ctx.cancel, &mut confirmer)
                .await?
            {
                eprintln!("Deleted topic {topic}");
            } else {
                eprintln!("Aborted");
            }
        }
        PubsubCommand::ListSubscriptions { topic } => {
            let subscriptions = match topic {
                Some(topic) => {
                    pubsub::subscriptions_of_topic(&ctx.client, &topic, &ctx.cancel).await?
                }
                None => pubsub::list_subscriptions(&ctx.client, &ctx.cancel).await?,
            };
            print_items(&subscriptions, SUBSCRIPTION_COLUMNS, ctx.format);
        }
        PubsubCommand::DescribeSubscription { subscription } => {
            let subscription = pubsub::describe_subscription(&ctx.client, &subscription).await?;
            print_value(&subscription, ctx.format);
        }
        PubsubCommand::CreateSubscription {
            subscription,
            topic,
            ack_deadline,
        } => {
            if let Some(seconds) = ack_deadline {
                if !(10..=600).contains(&seconds) {
                    return Err(GcpError::InvalidArgument(format!(
                        "--ack-deadline must be between 10 and 600 seconds, got {seconds}"
                    ))
                    .into());
                }
            }
            let topics = TopicNameCache::new();
            let created = pubsub::create_subscription(
                &ctx.client,
                &subscription,
                &topic,
                ack_deadline,
                &topics,
                &ctx.cancel,
            )
            .await?;
            print_value(&created, ctx.format);
        }
        PubsubCommand::DeleteSubscription { subscription } => {
            pubsub::delete_subscription(&ctx.client, &subscription).await?;
            eprintln!("Deleted subscription {subscription}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_as_key_value() {
        assert_eq!(
            parse_label("dept=eng").unwrap(),
            ("dept".to_string(), "eng".to_string())
        );
        assert!(parse_label("no-equals").is_err());
        assert!(parse_label("=value").is_err());
    }
}
