//! Error types for token storage operations

use aws_sdk_dynamodb::error::{BuildError, SdkError};
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use thiserror::Error;

/// Result type for token storage operations
pub type TokenStorageResult<T> = Result<T, TokenStorageError>;

/// Errors that can occur during token storage operations
#[derive(Error, Debug)]
pub enum TokenStorageError {
    /// Failed to upsert or update a token in DynamoDB
    #[error("Failed to update token in DynamoDB: {0}")]
    DynamoDbUpdateError(#[from] SdkError<UpdateItemError>),

    /// Failed to delete a token from DynamoDB
    #[error("Failed to delete token from DynamoDB: {0}")]
    DynamoDbDeleteError(#[from] SdkError<DeleteItemError>),

    /// Failed to query tokens from DynamoDB
    #[error("Failed to query tokens from DynamoDB: {0}")]
    DynamoDbQueryError(#[from] SdkError<QueryError>),

    /// Failed to batch-delete tokens from DynamoDB
    #[error("Failed to batch-delete tokens from DynamoDB: {0}")]
    DynamoDbBatchWriteError(#[from] SdkError<BatchWriteItemError>),

    /// Malformed batch request
    #[error("Invalid DynamoDB request: {0}")]
    RequestBuildError(#[from] BuildError),

    /// Stored item did not deserialize into a token
    #[error("Failed to parse token item: {0}")]
    ParseItemError(String),
}
