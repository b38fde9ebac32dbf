//! Error types for space storage operations

use aws_sdk_dynamodb::error::{BuildError, SdkError};
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use thiserror::Error;

/// Result type for space storage operations
pub type SpaceStorageResult<T> = Result<T, SpaceStorageError>;

/// Errors that can occur during space storage operations
#[derive(Error, Debug)]
pub enum SpaceStorageError {
    /// A space with this id is already registered
    #[error("Space already exists")]
    SpaceExists,

    /// No space matched the `(id, author)` pair
    #[error("Space not found")]
    SpaceNotFound,

    /// Failed to insert a space into DynamoDB
    #[error("Failed to insert space into DynamoDB: {0}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// Failed to delete a space from DynamoDB
    #[error("Failed to delete space from DynamoDB: {0}")]
    DynamoDbDeleteError(#[from] SdkError<DeleteItemError>),

    /// Failed to batch-read spaces from DynamoDB
    #[error("Failed to batch-read spaces from DynamoDB: {0}")]
    DynamoDbBatchGetError(#[from] SdkError<BatchGetItemError>),

    /// Malformed batch request
    #[error("Invalid DynamoDB request: {0}")]
    RequestBuildError(#[from] BuildError),

    /// Serialization error for `serde_dynamo`
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
