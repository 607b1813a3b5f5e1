//! Givebridge service binary.
//!
//! Wires the PostgreSQL stores, the PayOS gateway client, the Redis queue,
//! and the user-service client into the HTTP surface plus the two
//! background loops (outbox processor, queue consumer), then serves until
//! SIGINT/SIGTERM.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use givebridge::adapters::http::{donation_router, DonationAppState};
use givebridge::adapters::payos::PayOsGateway;
use givebridge::adapters::postgres::{
    PostgresCampaignStore, PostgresDonationStore, PostgresOutboxStore, PostgresWalletStore,
};
use givebridge::adapters::queue::{RedisCampaignCache, RedisQueue};
use givebridge::adapters::users::HttpUserDirectory;
use givebridge::application::{
    BadgeAwardService, CampaignSurplusHandler, CreateDonationHandler, HandlePaymentWebhookHandler,
    OutboxDispatcher, OutboxProcessor, PaymentSucceededHandler, PendingDonationHandler,
    QueueConsumer, TokioSleeper, WalletLedger,
};
use givebridge::config::AppConfig;
use givebridge::ports::Notifier;

/// Notifier that hands notices to the logging pipeline. Notification
/// content and delivery live in the notification service; this process
/// only emits the structured facts.
struct TracingNotifier;

#[async_trait::async_trait]
impl Notifier for TracingNotifier {
    async fn notify(
        &self,
        notice: givebridge::ports::DonationNotice,
    ) -> Result<(), givebridge::domain::foundation::DomainError> {
        tracing::info!(?notice, "donation notice");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.server.log_level)
        }))
        .json()
        .init();

    config.validate()?;

    // Infrastructure clients.
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let redis_client = redis::Client::open(config.redis.url.as_str())?;

    // Adapters.
    let donations = Arc::new(PostgresDonationStore::new(pool.clone()));
    let campaigns = Arc::new(PostgresCampaignStore::new(pool.clone()));
    let outbox = Arc::new(PostgresOutboxStore::new(pool.clone()));
    let wallets = Arc::new(PostgresWalletStore::new(pool.clone()));
    let gateway = Arc::new(PayOsGateway::new(&config.payment));
    let queue = Arc::new(RedisQueue::new(redis_client.clone(), &config.queue.name));
    let cache = Arc::new(RedisCampaignCache::new(redis_client, "campaign"));
    let users = Arc::new(HttpUserDirectory::new(&config.users));
    let notifier = Arc::new(TracingNotifier);

    // Application services.
    let sleeper = Arc::new(TokioSleeper);
    let ledger = Arc::new(WalletLedger::new(wallets));
    let badges = Arc::new(BadgeAwardService::new(
        config.badges.milestone_table(),
        users.clone(),
    ));

    let create_donation = Arc::new(CreateDonationHandler::new(
        campaigns.clone(),
        donations.clone(),
        gateway.clone(),
        queue.clone(),
        sleeper,
    ));
    let webhook = Arc::new(HandlePaymentWebhookHandler::new(
        gateway,
        donations.clone(),
    ));

    let payment_succeeded = Arc::new(PaymentSucceededHandler::new(
        ledger,
        donations.clone(),
        campaigns,
        outbox.clone(),
        users,
        notifier.clone(),
        cache.clone(),
        badges,
        config.wallet.admin_owner(),
    ));
    let surplus = Arc::new(CampaignSurplusHandler::new(notifier.clone()));

    let processor = Arc::new(OutboxProcessor::new(
        outbox,
        OutboxDispatcher::new()
            .register(payment_succeeded)
            .register(surplus),
        config.outbox.clone(),
    ));

    let pending_handler = Arc::new(PendingDonationHandler::new(notifier, cache));
    let consumer = Arc::new(QueueConsumer::new(
        queue,
        pending_handler,
        config.queue.clone(),
    ));

    // Background loops with shared shutdown signal.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let processor_task = {
        let processor = processor.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { processor.run(shutdown).await })
    };
    let consumer_task = {
        let consumer = consumer.clone();
        let shutdown = shutdown_rx;
        tokio::spawn(async move { consumer.run(shutdown).await })
    };

    // HTTP surface.
    let state = DonationAppState {
        create_donation,
        webhook,
        donations,
    };
    let router = donation_router(state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = config.server.socket_addr().map_err(|e| anyhow::anyhow!(e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Stop the background loops and let them drain.
    let _ = shutdown_tx.send(true);
    let _ = processor_task.await;
    let _ = consumer_task.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
