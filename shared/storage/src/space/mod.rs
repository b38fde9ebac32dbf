//! Space registry storage using DynamoDB
//!
//! One row per registered space, keyed by the base58 space key, with the
//! registering account as author. Uniqueness is enforced with a
//! conditional put.

mod error;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use chrono::Utc;
use strum::Display;

use push_domain::Space;

pub use error::{SpaceStorageError, SpaceStorageResult};

/// DynamoDB limit on keys per `BatchGetItem` call.
const BATCH_GET_LIMIT: usize = 100;

/// Attribute names for the spaces table
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SpaceAttribute {
    /// Base58 space key (Primary Key)
    Id,
    /// Account that registered the space
    Author,
    /// Creation timestamp (unix seconds)
    Created,
}

/// Space registry operations needed by the RPC surface.
#[async_trait]
pub trait SpaceRepo: Send + Sync {
    /// Registers a space; duplicate ids yield [`SpaceStorageError::SpaceExists`].
    async fn create(&self, space: &Space) -> SpaceStorageResult<()>;

    /// Removes the space matching `(id, author)`; zero deletions yield
    /// [`SpaceStorageError::SpaceNotFound`].
    async fn remove(&self, space: &Space) -> SpaceStorageResult<()>;

    /// Projection of registered ids from the provided set, used to filter
    /// notification topics down to admitted spaces.
    async fn existing_spaces(&self, space_ids: &[String]) -> SpaceStorageResult<Vec<String>>;
}

/// Space registry storage client for DynamoDB operations
pub struct SpaceStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl SpaceStorage {
    /// Creates a new space registry storage client
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured DynamoDB client
    /// * `table_name` - DynamoDB table name for spaces
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }

    /// Looks up which of `space_ids` are present in the registry,
    /// returned in input order.
    ///
    /// This is the real check behind [`SpaceRepo::existing_spaces`]; it
    /// takes over once the bypass there is lifted.
    ///
    /// # Errors
    ///
    /// Returns `SpaceStorageError` if the DynamoDB operation fails
    pub async fn registered_spaces(
        &self,
        space_ids: &[String],
    ) -> SpaceStorageResult<Vec<String>> {
        let mut found = HashSet::new();

        for chunk in space_ids.chunks(BATCH_GET_LIMIT) {
            let mut keys = Vec::with_capacity(chunk.len());
            for id in chunk {
                keys.push(HashMap::from([(
                    SpaceAttribute::Id.to_string(),
                    AttributeValue::S(id.clone()),
                )]));
            }
            let request = KeysAndAttributes::builder()
                .set_keys(Some(keys))
                .projection_expression("#id")
                .expression_attribute_names("#id", SpaceAttribute::Id.to_string())
                .build()?;

            let response = self
                .dynamodb_client
                .batch_get_item()
                .request_items(&self.table_name, request)
                .send()
                .await?;

            if let Some(items) = response
                .responses()
                .and_then(|tables| tables.get(&self.table_name))
            {
                for item in items {
                    if let Some(AttributeValue::S(id)) = item.get(&SpaceAttribute::Id.to_string())
                    {
                        found.insert(id.clone());
                    }
                }
            }
        }

        Ok(space_ids
            .iter()
            .filter(|id| found.contains(*id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SpaceRepo for SpaceStorage {
    async fn create(&self, space: &Space) -> SpaceStorageResult<()> {
        let space = Space {
            created: Utc::now().timestamp(),
            ..space.clone()
        };
        let item = serde_dynamo::to_item(&space)
            .map_err(|e| SpaceStorageError::SerializationError(e.to_string()))?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#id)")
            .expression_attribute_names("#id", SpaceAttribute::Id.to_string())
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    SpaceStorageError::SpaceExists
                } else {
                    err.into()
                }
            })?;

        Ok(())
    }

    async fn remove(&self, space: &Space) -> SpaceStorageResult<()> {
        self.dynamodb_client
            .delete_item()
            .table_name(&self.table_name)
            .key(
                SpaceAttribute::Id.to_string(),
                AttributeValue::S(space.id.clone()),
            )
            .condition_expression("#author = :author")
            .expression_attribute_names("#author", SpaceAttribute::Author.to_string())
            .expression_attribute_values(":author", AttributeValue::S(space.author.clone()))
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    SpaceStorageError::SpaceNotFound
                } else {
                    err.into()
                }
            })?;

        Ok(())
    }

    async fn existing_spaces(&self, space_ids: &[String]) -> SpaceStorageResult<Vec<String>> {
        // TODO: registry check is skipped until one-to-one spaces are able
        // to register themselves; switch to registered_spaces() then.
        Ok(space_ids.to_vec())
    }
}
