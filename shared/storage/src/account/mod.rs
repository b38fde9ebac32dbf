//! Account subscription storage using DynamoDB
//!
//! Holds the authoritative topic set per account, one item per
//! `(account_id, topic)` pair. The topic GSI supports the reverse lookup
//! used by the sender pool to resolve a notification's audience. The
//! logical model remains "an account's full topic set": every mutation
//! replaces the set wholesale.

mod error;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, Select, WriteRequest};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::Display;

use push_domain::Topic;

pub use error::{AccountStorageError, AccountStorageResult};

/// DynamoDB limit on items per `BatchWriteItem` call.
const BATCH_WRITE_LIMIT: usize = 25;

/// Attribute names for the account-topics table
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AccountTopicAttribute {
    /// Account id (Primary Key)
    AccountId,
    /// Full topic string (Sort Key, and Primary Key of the topic GSI)
    Topic,
    /// Creation timestamp (unix seconds), set once on first write
    Created,
    /// Last mutation timestamp (unix seconds)
    Updated,
}

/// One `(account, topic)` subscription pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTopicItem {
    pub account_id: String,
    pub topic: Topic,
    pub created: i64,
    pub updated: i64,
}

/// Subscription index operations needed by the RPC surface and the sender.
#[async_trait]
pub trait AccountRepo: Send + Sync {
    /// Replaces the account's topic set with `topics`.
    async fn set_account_topics(
        &self,
        account_id: &str,
        topics: &[Topic],
    ) -> AccountStorageResult<()>;

    /// Distinct account ids whose topic set intersects `topics`,
    /// first-seen order.
    async fn get_account_ids_by_topics(
        &self,
        topics: &[Topic],
    ) -> AccountStorageResult<Vec<String>>;

    /// The account's current topic set; empty when the account is unknown.
    async fn get_topics_by_account_id(&self, account_id: &str) -> AccountStorageResult<Vec<Topic>>;
}

/// Account subscription storage client for DynamoDB operations
pub struct AccountStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
    topic_index: String,
}

impl AccountStorage {
    /// Creates a new account subscription storage client
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured DynamoDB client
    /// * `table_name` - DynamoDB table name for account topics
    /// * `topic_index` - Global Secondary Index name for topic queries
    #[must_use]
    pub const fn new(
        dynamodb_client: Arc<DynamoDbClient>,
        table_name: String,
        topic_index: String,
    ) -> Self {
        Self {
            dynamodb_client,
            table_name,
            topic_index,
        }
    }

    async fn query_account_items(
        &self,
        account_id: &str,
    ) -> AccountStorageResult<Vec<AccountTopicItem>> {
        let response = self
            .dynamodb_client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("#account_id = :account_id")
            .expression_attribute_names(
                "#account_id",
                AccountTopicAttribute::AccountId.to_string(),
            )
            .expression_attribute_values(
                ":account_id",
                AttributeValue::S(account_id.to_string()),
            )
            .select(Select::AllAttributes)
            .send()
            .await?;

        response
            .items()
            .iter()
            .map(|item| {
                serde_dynamo::from_item(item.clone())
                    .map_err(|e| AccountStorageError::ParseItemError(e.to_string()))
            })
            .collect()
    }

    async fn delete_pairs(&self, account_id: &str, topics: &[Topic]) -> AccountStorageResult<()> {
        for chunk in topics.chunks(BATCH_WRITE_LIMIT) {
            let mut requests = Vec::with_capacity(chunk.len());
            for topic in chunk {
                let delete = DeleteRequest::builder()
                    .key(
                        AccountTopicAttribute::AccountId.to_string(),
                        AttributeValue::S(account_id.to_string()),
                    )
                    .key(
                        AccountTopicAttribute::Topic.to_string(),
                        AttributeValue::S(topic.as_str().to_string()),
                    )
                    .build()?;
                requests.push(WriteRequest::builder().delete_request(delete).build());
            }
            self.dynamodb_client
                .batch_write_item()
                .request_items(&self.table_name, requests)
                .send()
                .await?;
        }
        Ok(())
    }

    async fn upsert_pair(&self, account_id: &str, topic: &Topic, now: i64) -> AccountStorageResult<()> {
        self.dynamodb_client
            .update_item()
            .table_name(&self.table_name)
            .key(
                AccountTopicAttribute::AccountId.to_string(),
                AttributeValue::S(account_id.to_string()),
            )
            .key(
                AccountTopicAttribute::Topic.to_string(),
                AttributeValue::S(topic.as_str().to_string()),
            )
            .update_expression(
                "SET #updated = :now, #created = if_not_exists(#created, :now)",
            )
            .expression_attribute_names("#updated", AccountTopicAttribute::Updated.to_string())
            .expression_attribute_names("#created", AccountTopicAttribute::Created.to_string())
            .expression_attribute_values(":now", AttributeValue::N(now.to_string()))
            .send()
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AccountRepo for AccountStorage {
    async fn set_account_topics(
        &self,
        account_id: &str,
        topics: &[Topic],
    ) -> AccountStorageResult<()> {
        let now = Utc::now().timestamp();

        let desired: HashSet<&Topic> = topics.iter().collect();
        let current = self.query_account_items(account_id).await?;

        let stale: Vec<Topic> = current
            .iter()
            .filter(|item| !desired.contains(&item.topic))
            .map(|item| item.topic.clone())
            .collect();
        self.delete_pairs(account_id, &stale).await?;

        // Duplicates in the input collapse onto the same item.
        let mut written = HashSet::new();
        for topic in topics {
            if written.insert(topic) {
                self.upsert_pair(account_id, topic, now).await?;
            }
        }
        Ok(())
    }

    async fn get_account_ids_by_topics(
        &self,
        topics: &[Topic],
    ) -> AccountStorageResult<Vec<String>> {
        let mut seen = HashSet::new();
        let mut account_ids = Vec::new();

        for topic in topics {
            let response = self
                .dynamodb_client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.topic_index)
                .key_condition_expression("#topic = :topic")
                .expression_attribute_names("#topic", AccountTopicAttribute::Topic.to_string())
                .expression_attribute_values(
                    ":topic",
                    AttributeValue::S(topic.as_str().to_string()),
                )
                .select(Select::AllAttributes)
                .send()
                .await?;

            for item in response.items() {
                let parsed: AccountTopicItem = serde_dynamo::from_item(item.clone())
                    .map_err(|e| AccountStorageError::ParseItemError(e.to_string()))?;
                if seen.insert(parsed.account_id.clone()) {
                    account_ids.push(parsed.account_id);
                }
            }
        }
        Ok(account_ids)
    }

    async fn get_topics_by_account_id(&self, account_id: &str) -> AccountStorageResult<Vec<Topic>> {
        Ok(self
            .query_account_items(account_id)
            .await?
            .into_iter()
            .map(|item| item.topic)
            .collect())
    }
}
