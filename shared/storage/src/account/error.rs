//! Error types for account/topic storage operations

use aws_sdk_dynamodb::error::{BuildError, SdkError};
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use thiserror::Error;

/// Result type for account storage operations
pub type AccountStorageResult<T> = Result<T, AccountStorageError>;

/// Errors that can occur during account/topic storage operations
#[derive(Error, Debug)]
pub enum AccountStorageError {
    /// Failed to query account topics from DynamoDB
    #[error("Failed to query account topics from DynamoDB: {0}")]
    DynamoDbQueryError(#[from] SdkError<QueryError>),

    /// Failed to update an account topic item in DynamoDB
    #[error("Failed to update account topic in DynamoDB: {0}")]
    DynamoDbUpdateError(#[from] SdkError<UpdateItemError>),

    /// Failed to batch-delete account topic items from DynamoDB
    #[error("Failed to batch-write account topics in DynamoDB: {0}")]
    DynamoDbBatchWriteError(#[from] SdkError<BatchWriteItemError>),

    /// Malformed batch request
    #[error("Invalid DynamoDB request: {0}")]
    RequestBuildError(#[from] BuildError),

    /// Stored item did not deserialize into an account topic
    #[error("Failed to parse account topic item: {0}")]
    ParseItemError(String),
}
