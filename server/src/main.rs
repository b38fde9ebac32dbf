use std::sync::Arc;
use std::time::Duration;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_sqs::Client as SqsClient;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use push_domain::{Platform, QueuedMessage};
use push_sender::provider::fcm::FcmProvider;
use push_sender::{Sender, SenderConfig};
use push_storage::{AccountStorage, SpaceStorage, SqsQueue, TokenStorage};

use push_server::config::{Cli, Config};
use push_server::push::PushService;
use push_server::{debug, server};

/// Bound on draining in-flight work during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_file(&cli.config)?;
    info!(account = %config.account, "starting push server");
    push_sender::metrics::describe();

    let shutdown = CancellationToken::new();

    if let Ok(addr) = std::env::var(debug::DEBUG_ADDR_ENV) {
        if !addr.is_empty() {
            let token = shutdown.clone();
            tokio::spawn(async move {
                if let Err(err) = debug::start(addr, token).await {
                    warn!(error = %err, "debug server failed");
                }
            });
        }
    }

    // AWS clients, repositories, queue, sender, RPC surface: constructed
    // in dependency order, released in reverse on shutdown.
    let mut aws_loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = config.aws.region.clone() {
        aws_loader = aws_loader.region(Region::new(region));
    }
    if let Some(endpoint_url) = &config.aws.endpoint_url {
        aws_loader = aws_loader.endpoint_url(endpoint_url);
    }
    let aws = aws_loader.load().await;

    let dynamodb_client = Arc::new(DynamoDbClient::new(&aws));
    let sqs_client = Arc::new(SqsClient::new(&aws));

    let account_repo = Arc::new(AccountStorage::new(
        dynamodb_client.clone(),
        config.storage.account_topics_table.clone(),
        config.storage.topic_index.clone(),
    ));
    let token_repo = Arc::new(TokenStorage::new(
        dynamodb_client.clone(),
        config.storage.tokens_table.clone(),
        config.storage.account_index.clone(),
    ));
    let space_repo = Arc::new(SpaceStorage::new(
        dynamodb_client,
        config.storage.spaces_table.clone(),
    ));
    let queue = Arc::new(SqsQueue::<QueuedMessage>::new(
        sqs_client,
        config.queue.clone(),
    ));

    let service = Arc::new(PushService::new(
        account_repo.clone(),
        token_repo.clone(),
        space_repo,
        queue.clone(),
    ));

    let mut sender = Sender::new(
        account_repo,
        token_repo,
        queue,
        SenderConfig {
            num_workers: config.sender.workers,
            ..SenderConfig::default()
        },
    );
    match &config.fcm {
        Some(fcm) => {
            let ios = FcmProvider::new(&fcm.credentials_file.ios, fcm.default_message.clone())
                .await?;
            sender.register_provider(Platform::Ios, Arc::new(ios));
            let android =
                FcmProvider::new(&fcm.credentials_file.android, fcm.default_message.clone())
                    .await?;
            sender.register_provider(Platform::Android, Arc::new(android));
        }
        None => warn!("fcm is not configured, notifications will not be delivered"),
    }
    let sender_handle = sender.start(shutdown.clone());

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("received exit signal, stopping");
            shutdown.cancel();
        });
    }

    server::start(config.listen.addr, service, shutdown.clone()).await?;

    shutdown.cancel();
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, sender_handle.join())
        .await
        .is_err()
    {
        warn!("shutdown timed out before in-flight work drained");
    }
    info!("goodbye");
    Ok(())
}

async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = match signal(SignalKind::interrupt()) {
        Ok(signal) => signal,
        Err(err) => {
            warn!(error = %err, "can't install SIGINT handler");
            return std::future::pending::<()>().await;
        }
    };
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(signal) => signal,
        Err(err) => {
            warn!(error = %err, "can't install SIGTERM handler");
            return std::future::pending::<()>().await;
        }
    };
    let mut quit = match signal(SignalKind::quit()) {
        Ok(signal) => signal,
        Err(err) => {
            warn!(error = %err, "can't install SIGQUIT handler");
            return std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
        _ = quit.recv() => {}
    }
}
