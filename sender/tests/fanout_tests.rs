//! End-to-end sender pool scenarios over in-memory fakes

mod utils;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use push_domain::{Platform, QueuedMessage, Token, TokenStatus, Topic};
use push_sender::provider::fcm::{DefaultMessage, FcmProvider, TokenError};
use push_sender::{Sender, SenderConfig};

use utils::{wait_until, InMemoryAccountRepo, InMemoryQueue, InMemoryTokenRepo, MockGateway};

fn android_token(id: &str, account_id: &str) -> Token {
    Token {
        id: id.to_string(),
        account_id: account_id.to_string(),
        peer_id: format!("peer-{id}"),
        platform: Platform::Android,
        status: TokenStatus::Valid,
        created: 0,
        updated: 0,
    }
}

fn notify_message(topics: Vec<Topic>, ignore: Option<&str>) -> QueuedMessage {
    QueuedMessage {
        ignore_account_id: ignore.map(str::to_string),
        key_id: String::new(),
        payload: vec![1, 2, 3],
        signature: vec![9, 9],
        topics,
        group_id: "g1".to_string(),
        silent: false,
        created: Utc::now(),
    }
}

fn defaults() -> DefaultMessage {
    DefaultMessage {
        title: "New message".to_string(),
        body: "You have a new message".to_string(),
        image_url: "https://example.org/icon.png".to_string(),
    }
}

struct Fixture {
    token_repo: Arc<InMemoryTokenRepo>,
    queue: Arc<InMemoryQueue>,
}

fn build_sender(
    account_repo: Arc<InMemoryAccountRepo>,
    token_repo: Arc<InMemoryTokenRepo>,
    queue: Arc<InMemoryQueue>,
    gateway: Arc<MockGateway>,
) -> (Sender, Fixture) {
    let provider = Arc::new(FcmProvider::with_client(gateway, defaults()));
    let mut sender = Sender::new(
        account_repo,
        token_repo.clone(),
        queue.clone(),
        SenderConfig {
            num_workers: 2,
            ..SenderConfig::default()
        },
    );
    sender.register_provider(Platform::Android, provider);
    (sender, Fixture { token_repo, queue })
}

#[tokio::test(start_paused = true)]
async fn resolves_subscription_and_delivers_via_gateway() {
    let topic = Topic::new(&[1u8; 32], "x");
    let account_repo = Arc::new(InMemoryAccountRepo::with_subscriptions([(
        "A1".to_string(),
        vec![topic.clone()],
    )]));
    let token_repo = Arc::new(InMemoryTokenRepo::with_tokens(vec![android_token(
        "tkA", "A1",
    )]));
    let queue = Arc::new(InMemoryQueue::with_messages([notify_message(
        vec![topic],
        Some("A2"),
    )]));
    let gateway = Arc::new(MockGateway::default());

    let (sender, fx) = build_sender(account_repo, token_repo, queue, gateway.clone());
    let shutdown = CancellationToken::new();
    let handle = sender.start(shutdown.clone());

    wait_until(Duration::from_secs(5), || {
        !fx.queue.acked.lock().unwrap().is_empty()
    })
    .await;
    shutdown.cancel();
    handle.join().await;

    let batches = gateway.batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    let (push, tokens) = &batches[0];
    assert_eq!(tokens, &vec!["tkA".to_string()]);
    assert_eq!(push.data["x-any-key-id"], "");
    assert_eq!(push.data["x-any-payload"], "AQID");
    assert_eq!(push.data["x-any-signature"], "CQk=");
    // Android notification embeds the configured defaults.
    assert_eq!(push.data["x-any-title"], "New message");
    assert_eq!(push.data["x-any-body"], "You have a new message");
    assert_eq!(push.data["x-any-image-url"], "https://example.org/icon.png");
    assert_eq!(push.notification, None);
    assert!(fx.queue.rejected.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn sender_account_is_excluded_from_delivery() {
    let topic = Topic::new(&[1u8; 32], "x");
    let account_repo = Arc::new(InMemoryAccountRepo::with_subscriptions([(
        "A1".to_string(),
        vec![topic.clone()],
    )]));
    let token_repo = Arc::new(InMemoryTokenRepo::with_tokens(vec![android_token(
        "tkA", "A1",
    )]));
    // The only subscriber is the sender itself.
    let queue = Arc::new(InMemoryQueue::with_messages([notify_message(
        vec![topic],
        Some("A1"),
    )]));
    let gateway = Arc::new(MockGateway::default());

    let (sender, fx) = build_sender(account_repo, token_repo, queue, gateway.clone());
    let shutdown = CancellationToken::new();
    let handle = sender.start(shutdown.clone());

    wait_until(Duration::from_secs(5), || {
        !fx.queue.acked.lock().unwrap().is_empty()
    })
    .await;
    shutdown.cancel();
    handle.join().await;

    assert!(gateway.batches.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn silent_message_without_ignore_reaches_all_subscribers() {
    let topic = Topic::new(&[1u8; 32], "A1");
    let account_repo = Arc::new(InMemoryAccountRepo::with_subscriptions([(
        "A1".to_string(),
        vec![topic.clone()],
    )]));
    let token_repo = Arc::new(InMemoryTokenRepo::with_tokens(vec![android_token(
        "tkA", "A1",
    )]));
    let queue = Arc::new(InMemoryQueue::with_messages([QueuedMessage {
        ignore_account_id: None,
        key_id: String::new(),
        payload: Vec::new(),
        signature: Vec::new(),
        topics: vec![topic],
        group_id: String::new(),
        silent: true,
        created: Utc::now(),
    }]));
    let gateway = Arc::new(MockGateway::default());

    let (sender, fx) = build_sender(account_repo, token_repo, queue, gateway.clone());
    let shutdown = CancellationToken::new();
    let handle = sender.start(shutdown.clone());

    wait_until(Duration::from_secs(5), || {
        !fx.queue.acked.lock().unwrap().is_empty()
    })
    .await;
    shutdown.cancel();
    handle.join().await;

    let batches = gateway.batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    let (push, tokens) = &batches[0];
    assert_eq!(tokens, &vec!["tkA".to_string()]);
    // Silent pushes stay data-only, without the embedded defaults.
    assert!(!push.data.contains_key("x-any-title"));
}

#[tokio::test(start_paused = true)]
async fn gateway_failure_returns_message_to_queue() {
    let topic = Topic::new(&[1u8; 32], "x");
    let account_repo = Arc::new(InMemoryAccountRepo::with_subscriptions([(
        "A1".to_string(),
        vec![topic.clone()],
    )]));
    let token_repo = Arc::new(InMemoryTokenRepo::with_tokens(vec![android_token(
        "tkA", "A1",
    )]));
    let queue = Arc::new(InMemoryQueue::with_messages([notify_message(
        vec![topic],
        Some("A2"),
    )]));
    let gateway = Arc::new(MockGateway::erroring());

    let (sender, fx) = build_sender(account_repo, token_repo, queue, gateway);
    let shutdown = CancellationToken::new();
    let handle = sender.start(shutdown.clone());

    wait_until(Duration::from_secs(5), || {
        !fx.queue.rejected.lock().unwrap().is_empty()
    })
    .await;
    shutdown.cancel();
    handle.join().await;

    assert!(fx.queue.acked.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dead_tokens_are_recycled_in_one_batch() {
    let topic = Topic::new(&[1u8; 32], "x");
    let account_repo = Arc::new(InMemoryAccountRepo::with_subscriptions([(
        "A1".to_string(),
        vec![topic.clone()],
    )]));
    let tokens: Vec<Token> = (0..12)
        .map(|i| android_token(&format!("tk{i}"), "A1"))
        .collect();
    let token_repo = Arc::new(InMemoryTokenRepo::with_tokens(tokens));
    let queue = Arc::new(InMemoryQueue::with_messages([notify_message(
        vec![topic],
        Some("A2"),
    )]));
    let unregistered = TokenError {
        status: "UNREGISTERED".to_string(),
        message: String::new(),
    };
    let transient = TokenError {
        status: "UNAVAILABLE".to_string(),
        message: String::new(),
    };
    let gateway = Arc::new(MockGateway::failing([
        ("tk3".to_string(), unregistered.clone()),
        ("tk5".to_string(), transient),
        ("tk7".to_string(), unregistered),
    ]));

    let (sender, fx) = build_sender(account_repo, token_repo, queue, gateway);
    let shutdown = CancellationToken::new();
    let handle = sender.start(shutdown.clone());

    // Transient per-token failures do not fail the batch.
    wait_until(Duration::from_secs(5), || {
        !fx.queue.acked.lock().unwrap().is_empty()
    })
    .await;

    // The partial batch flushes within the one-second window.
    wait_until(Duration::from_secs(5), || {
        !fx.token_repo.removed.lock().unwrap().is_empty()
    })
    .await;
    shutdown.cancel();
    handle.join().await;

    let removed = fx.token_repo.removed.lock().unwrap().clone();
    assert_eq!(removed, vec![vec!["tk3".to_string(), "tk7".to_string()]]);
}
