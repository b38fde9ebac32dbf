//! Account-topics table tests against a local DynamoDB endpoint
//!
//! Run with a LocalStack (or dynamodb-local) instance on port 4566:
//! `cargo test -p push-storage -- --ignored`

use std::sync::Arc;
use std::time::Duration;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
    ProjectionType, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use uuid::Uuid;

use push_domain::Topic;
use push_storage::account::{AccountRepo, AccountStorage, AccountTopicAttribute};

const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";
const TEST_REGION: &str = "us-east-1";
const TOPIC_INDEX: &str = "topic-index";

struct TestContext {
    storage: AccountStorage,
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

async fn dynamodb_client() -> Arc<DynamoDbClient> {
    let config = aws_config::defaults(BehaviorVersion::latest())
        .endpoint_url(LOCALSTACK_ENDPOINT)
        .region(Region::new(TEST_REGION))
        .credentials_provider(Credentials::new("test", "test", None, None, "test"))
        .load()
        .await;
    Arc::new(DynamoDbClient::new(&config))
}

async fn setup_test() -> TestContext {
    let table_name = format!("test-account-topics-{}", Uuid::new_v4());
    let dynamodb_client = dynamodb_client().await;

    dynamodb_client
        .create_table()
        .table_name(&table_name)
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(AccountTopicAttribute::AccountId.to_string())
                .attribute_type(ScalarAttributeType::S)
                .build()
                .unwrap(),
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(AccountTopicAttribute::Topic.to_string())
                .attribute_type(ScalarAttributeType::S)
                .build()
                .unwrap(),
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(AccountTopicAttribute::AccountId.to_string())
                .key_type(KeyType::Hash)
                .build()
                .unwrap(),
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(AccountTopicAttribute::Topic.to_string())
                .key_type(KeyType::Range)
                .build()
                .unwrap(),
        )
        .global_secondary_indexes(
            GlobalSecondaryIndex::builder()
                .index_name(TOPIC_INDEX)
                .key_schema(
                    KeySchemaElement::builder()
                        .attribute_name(AccountTopicAttribute::Topic.to_string())
                        .key_type(KeyType::Hash)
                        .build()
                        .unwrap(),
                )
                .projection(
                    Projection::builder()
                        .projection_type(ProjectionType::All)
                        .build(),
                )
                .build()
                .unwrap(),
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await
        .expect("Failed to create test table");

    tokio::time::sleep(Duration::from_millis(100)).await;

    let storage = AccountStorage::new(
        dynamodb_client.clone(),
        table_name.clone(),
        TOPIC_INDEX.to_string(),
    );
    TestContext {
        storage,
        table_name,
        dynamodb_client,
    }
}

fn topic(name: &str) -> Topic {
    Topic::new(&[7u8; 32], name)
}

#[tokio::test]
#[ignore = "requires a local DynamoDB endpoint"]
async fn set_topics_replaces_the_whole_set() {
    let ctx = setup_test().await;

    ctx.storage
        .set_account_topics("A1", &[topic("a"), topic("b")])
        .await
        .unwrap();
    ctx.storage
        .set_account_topics("A1", &[topic("b"), topic("c")])
        .await
        .unwrap();

    let mut topics = ctx.storage.get_topics_by_account_id("A1").await.unwrap();
    topics.sort();
    assert_eq!(topics, vec![topic("b"), topic("c")]);
}

#[tokio::test]
#[ignore = "requires a local DynamoDB endpoint"]
async fn unknown_account_has_no_topics() {
    let ctx = setup_test().await;
    assert!(ctx
        .storage
        .get_topics_by_account_id("missing")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
#[ignore = "requires a local DynamoDB endpoint"]
async fn reverse_lookup_returns_accounts_with_intersecting_sets() {
    let ctx = setup_test().await;

    ctx.storage
        .set_account_topics("A1", &[topic("a"), topic("b")])
        .await
        .unwrap();
    ctx.storage
        .set_account_topics("A2", &[topic("b")])
        .await
        .unwrap();
    ctx.storage
        .set_account_topics("A3", &[topic("c")])
        .await
        .unwrap();

    let mut account_ids = ctx
        .storage
        .get_account_ids_by_topics(&[topic("a"), topic("b")])
        .await
        .unwrap();
    account_ids.sort();
    assert_eq!(account_ids, vec!["A1".to_string(), "A2".to_string()]);
}
