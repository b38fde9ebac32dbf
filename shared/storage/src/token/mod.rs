//! Device token storage using DynamoDB
//!
//! Tokens are keyed by the provider-issued token id; the account GSI
//! (account id + status) backs the resolve step of the sender pool.

mod error;

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, Select, WriteRequest};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use chrono::Utc;
use strum::Display;

use push_domain::{Token, TokenStatus};

pub use error::{TokenStorageError, TokenStorageResult};

/// DynamoDB limit on items per `BatchWriteItem` call.
const BATCH_WRITE_LIMIT: usize = 25;

/// Attribute names for the tokens table
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TokenAttribute {
    /// Provider-issued device token (Primary Key)
    Id,
    /// Owning account (Primary Key of the account GSI)
    AccountId,
    /// Registering peer device
    PeerId,
    /// Mobile platform
    Platform,
    /// Delivery status (Sort Key of the account GSI)
    Status,
    /// Creation timestamp (unix seconds), set once on first write
    Created,
    /// Last mutation timestamp (unix seconds)
    Updated,
}

/// Token operations needed by the RPC surface and the sender pool.
#[async_trait]
pub trait TokenRepo: Send + Sync {
    /// Upserts a token row keyed by the token id; a re-set of the same
    /// token updates peer, platform and status.
    async fn add_token(&self, token: &Token) -> TokenStorageResult<()>;

    /// Sets the status of an existing token; unknown ids are a no-op.
    async fn update_token_status(
        &self,
        token_id: &str,
        status: TokenStatus,
    ) -> TokenStorageResult<()>;

    /// Deletes the token registered by `(account_id, peer_id)`; absent
    /// rows are not an error.
    async fn revoke_token(&self, account_id: &str, peer_id: &str) -> TokenStorageResult<()>;

    /// All tokens with `status = valid` belonging to the given accounts.
    async fn get_active_tokens_by_account_ids(
        &self,
        account_ids: &[String],
    ) -> TokenStorageResult<Vec<Token>>;

    /// Bulk-deletes tokens by id.
    async fn remove_tokens(&self, token_ids: &[String]) -> TokenStorageResult<()>;
}

/// Token storage client for DynamoDB operations
pub struct TokenStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
    account_index: String,
}

impl TokenStorage {
    /// Creates a new token storage client
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured DynamoDB client
    /// * `table_name` - DynamoDB table name for tokens
    /// * `account_index` - GSI name keyed by `(account_id, status)`
    #[must_use]
    pub const fn new(
        dynamodb_client: Arc<DynamoDbClient>,
        table_name: String,
        account_index: String,
    ) -> Self {
        Self {
            dynamodb_client,
            table_name,
            account_index,
        }
    }

    async fn query_account_tokens(
        &self,
        account_id: &str,
        status: Option<TokenStatus>,
    ) -> TokenStorageResult<Vec<Token>> {
        let mut query = self
            .dynamodb_client
            .query()
            .table_name(&self.table_name)
            .index_name(&self.account_index)
            .expression_attribute_names("#account_id", TokenAttribute::AccountId.to_string())
            .expression_attribute_values(
                ":account_id",
                AttributeValue::S(account_id.to_string()),
            )
            .select(Select::AllAttributes);

        query = match status {
            Some(status) => query
                .key_condition_expression("#account_id = :account_id AND #status = :status")
                .expression_attribute_names("#status", TokenAttribute::Status.to_string())
                .expression_attribute_values(":status", AttributeValue::S(status.to_string())),
            None => query.key_condition_expression("#account_id = :account_id"),
        };

        let response = query.send().await?;
        response
            .items()
            .iter()
            .map(|item| {
                serde_dynamo::from_item(item.clone())
                    .map_err(|e| TokenStorageError::ParseItemError(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl TokenRepo for TokenStorage {
    async fn add_token(&self, token: &Token) -> TokenStorageResult<()> {
        let now = Utc::now().timestamp();
        self.dynamodb_client
            .update_item()
            .table_name(&self.table_name)
            .key(
                TokenAttribute::Id.to_string(),
                AttributeValue::S(token.id.clone()),
            )
            .update_expression(
                "SET #account_id = :account_id, #peer_id = :peer_id, #platform = :platform, \
                 #status = :status, #updated = :now, #created = if_not_exists(#created, :now)",
            )
            .expression_attribute_names("#account_id", TokenAttribute::AccountId.to_string())
            .expression_attribute_names("#peer_id", TokenAttribute::PeerId.to_string())
            .expression_attribute_names("#platform", TokenAttribute::Platform.to_string())
            .expression_attribute_names("#status", TokenAttribute::Status.to_string())
            .expression_attribute_names("#updated", TokenAttribute::Updated.to_string())
            .expression_attribute_names("#created", TokenAttribute::Created.to_string())
            .expression_attribute_values(":account_id", AttributeValue::S(token.account_id.clone()))
            .expression_attribute_values(":peer_id", AttributeValue::S(token.peer_id.clone()))
            .expression_attribute_values(":platform", AttributeValue::S(token.platform.to_string()))
            .expression_attribute_values(":status", AttributeValue::S(token.status.to_string()))
            .expression_attribute_values(":now", AttributeValue::N(now.to_string()))
            .send()
            .await?;
        Ok(())
    }

    async fn update_token_status(
        &self,
        token_id: &str,
        status: TokenStatus,
    ) -> TokenStorageResult<()> {
        let result = self
            .dynamodb_client
            .update_item()
            .table_name(&self.table_name)
            .key(
                TokenAttribute::Id.to_string(),
                AttributeValue::S(token_id.to_string()),
            )
            .update_expression("SET #status = :status, #updated = :now")
            .condition_expression("attribute_exists(#id)")
            .expression_attribute_names("#id", TokenAttribute::Id.to_string())
            .expression_attribute_names("#status", TokenAttribute::Status.to_string())
            .expression_attribute_names("#updated", TokenAttribute::Updated.to_string())
            .expression_attribute_values(":status", AttributeValue::S(status.to_string()))
            .expression_attribute_values(
                ":now",
                AttributeValue::N(Utc::now().timestamp().to_string()),
            )
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            // An unknown token id is a no-op, matching the upstream write.
            Err(SdkError::ServiceError(ref svc))
                if svc.err().is_conditional_check_failed_exception() =>
            {
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn revoke_token(&self, account_id: &str, peer_id: &str) -> TokenStorageResult<()> {
        let tokens = self.query_account_tokens(account_id, None).await?;
        for token in tokens.into_iter().filter(|t| t.peer_id == peer_id) {
            self.dynamodb_client
                .delete_item()
                .table_name(&self.table_name)
                .key(TokenAttribute::Id.to_string(), AttributeValue::S(token.id))
                .send()
                .await?;
        }
        Ok(())
    }

    async fn get_active_tokens_by_account_ids(
        &self,
        account_ids: &[String],
    ) -> TokenStorageResult<Vec<Token>> {
        let mut tokens = Vec::new();
        for account_id in account_ids {
            tokens.extend(
                self.query_account_tokens(account_id, Some(TokenStatus::Valid))
                    .await?,
            );
        }
        Ok(tokens)
    }

    async fn remove_tokens(&self, token_ids: &[String]) -> TokenStorageResult<()> {
        for chunk in token_ids.chunks(BATCH_WRITE_LIMIT) {
            let mut requests = Vec::with_capacity(chunk.len());
            for token_id in chunk {
                let delete = DeleteRequest::builder()
                    .key(
                        TokenAttribute::Id.to_string(),
                        AttributeValue::S(token_id.clone()),
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
}
