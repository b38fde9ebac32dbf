//! Space table tests against a local DynamoDB endpoint

use std::sync::Arc;
use std::time::Duration;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use uuid::Uuid;

use push_domain::Space;
use push_storage::space::{SpaceAttribute, SpaceRepo, SpaceStorage, SpaceStorageError};

const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";
const TEST_REGION: &str = "us-east-1";

struct TestContext {
    storage: SpaceStorage,
    table_name: String,
    dynamodb_client: Arc<DynamoDbClient>,
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let client = self.dynamodb_client.clone();
        let table = self.table_name.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = client.delete_table().table_name(&table).send().await;
            });
        }
    }
}

async fn setup_test() -> TestContext {
    let table_name = format!("test-spaces-{}", Uuid::new_v4());
    let config = aws_config::defaults(BehaviorVersion::latest())
        .endpoint_url(LOCALSTACK_ENDPOINT)
        .region(Region::new(TEST_REGION))
        .credentials_provider(Credentials::new("test", "test", None, None, "test"))
        .load()
        .await;
    let dynamodb_client = Arc::new(DynamoDbClient::new(&config));

    dynamodb_client
        .create_table()
        .table_name(&table_name)
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(SpaceAttribute::Id.to_string())
                .attribute_type(ScalarAttributeType::S)
                .build()
                .unwrap(),
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(SpaceAttribute::Id.to_string())
                .key_type(KeyType::Hash)
                .build()
                .unwrap(),
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await
        .expect("Failed to create test table");

    tokio::time::sleep(Duration::from_millis(100)).await;

    let storage = SpaceStorage::new(dynamodb_client.clone(), table_name.clone());
    TestContext {
        storage,
        table_name,
        dynamodb_client,
    }
}

fn space(id: &str, author: &str) -> Space {
    Space {
        id: id.to_string(),
        author: author.to_string(),
        created: 0,
    }
}

#[tokio::test]
#[ignore = "requires a local DynamoDB endpoint"]
async fn duplicate_create_yields_space_exists() {
    let ctx = setup_test().await;

    ctx.storage.create(&space("K1", "A1")).await.unwrap();
    let err = ctx.storage.create(&space("K1", "A2")).await.unwrap_err();
    assert!(matches!(err, SpaceStorageError::SpaceExists));
}

#[tokio::test]
#[ignore = "requires a local DynamoDB endpoint"]
async fn remove_requires_the_author() {
    let ctx = setup_test().await;

    ctx.storage.create(&space("K1", "A1")).await.unwrap();

    let err = ctx.storage.remove(&space("K1", "A2")).await.unwrap_err();
    assert!(matches!(err, SpaceStorageError::SpaceNotFound));

    ctx.storage.remove(&space("K1", "A1")).await.unwrap();
    let err = ctx.storage.remove(&space("K1", "A1")).await.unwrap_err();
    assert!(matches!(err, SpaceStorageError::SpaceNotFound));
}

#[tokio::test]
#[ignore = "requires a local DynamoDB endpoint"]
async fn existing_spaces_is_currently_a_pass_through() {
    let ctx = setup_test().await;

    let ids = vec!["K1".to_string(), "K2".to_string()];
    let existing = ctx.storage.existing_spaces(&ids).await.unwrap();
    assert_eq!(existing, ids);
}

#[tokio::test]
#[ignore = "requires a local DynamoDB endpoint"]
async fn registered_spaces_projects_known_ids() {
    let ctx = setup_test().await;

    ctx.storage.create(&space("K1", "A1")).await.unwrap();

    let registered = ctx
        .storage
        .registered_spaces(&["K1".to_string(), "K2".to_string()])
        .await
        .unwrap();
    assert_eq!(registered, vec!["K1".to_string()]);
}
