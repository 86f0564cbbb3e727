//! Prepay gateway server binary.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use sqlx::mysql::MySqlPool;
use tracing_subscriber::EnvFilter;

use prepay_gateway::adapters::http::{app_router, PaymentAppState};
use prepay_gateway::adapters::{
    HttpOrderLedger, LedgerClient, MySqlEntitlementStore, MySqlProcessedNotificationStore,
    WechatPayAdapter, WechatPayConfig,
};
use prepay_gateway::config::{AppConfig, DatabaseConfig, PaymentConfig, ServerConfig};
use prepay_gateway::domain::entitlement::EntitlementPolicy;
use prepay_gateway::domain::foundation::Timestamp;
use prepay_gateway::domain::payment::OrderType;
use prepay_gateway::ports::ProcessedNotificationStore;

/// Processed-notification records older than this are pruned.
const DEDUP_RETENTION_SECS: i64 = 30 * 24 * 3600;
const DEDUP_PRUNE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let pool = connect(&config.database).await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let ledger = HttpOrderLedger::new(LedgerClient::new(
        config.ledger.base_url.clone(),
        config.ledger.timeout(),
    )?);
    let provider = WechatPayAdapter::from_key_files(
        wechat_config(&config.payment),
        &config.payment.private_key_path,
        &config.payment.platform_public_key_path,
    )?;
    let entitlements = Arc::new(MySqlEntitlementStore::new(pool.clone()));
    let processed = Arc::new(MySqlProcessedNotificationStore::new(pool.clone()));

    spawn_dedup_pruning(processed.clone());

    let state = PaymentAppState {
        ledger: Arc::new(ledger),
        payment_provider: Arc::new(provider),
        entitlement_reader: entitlements.clone(),
        entitlement_repository: entitlements,
        processed_notifications: processed,
        entitlement_policy: EntitlementPolicy::new(
            config
                .entitlement
                .eligible_order_types
                .iter()
                .copied()
                .map(OrderType::new),
        ),
        admin_token: config.admin.token.clone().filter(|_| config.admin.is_enabled()),
    };
    if state.admin_token.is_none() {
        tracing::warn!("No admin token configured; entitlement administration is disabled");
    }

    let app = app_router(
        state,
        &config.server.cors_origins_list(),
        config.server.request_timeout(),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Prepay gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if server.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn connect(database: &DatabaseConfig) -> Result<MySqlPool, sqlx::Error> {
    database.pool_options().connect(&database.url).await
}

fn wechat_config(payment: &PaymentConfig) -> WechatPayConfig {
    WechatPayConfig {
        app_id: payment.app_id.clone(),
        mch_id: payment.mch_id.clone(),
        merchant_serial_no: payment.merchant_serial_no.clone(),
        api_v3_key: payment.api_v3_key.clone(),
        platform_serial_no: payment.platform_serial_no.clone(),
        notify_url: payment.notify_url.clone(),
        description: payment.description.clone(),
        attach: payment.attach.clone(),
        api_base_url: payment.api_base_url.clone(),
        timeout: payment.timeout(),
    }
}

fn spawn_dedup_pruning(store: Arc<MySqlProcessedNotificationStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(DEDUP_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let cutoff = Timestamp::now().plus_secs(-DEDUP_RETENTION_SECS);
            match store.delete_before(cutoff).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Pruned processed notification records"),
                Err(e) => tracing::warn!(error = %e, "Processed notification pruning failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
