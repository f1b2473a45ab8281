use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use vocab_bot::config::{Config, TransportMode};
use vocab_bot::db::Database;
use vocab_bot::dispatcher::Dispatcher;
use vocab_bot::poller::Poller;
use vocab_bot::quiz::QuizEngine;
use vocab_bot::router::Router;
use vocab_bot::server::{self, AppState};
use vocab_bot::store::{MemoryStore, Store};
use vocab_bot::telegram::TelegramClient;
use vocab_bot::translator::GoogleTranslator;
use vocab_bot::user_config::ConfigStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vocab_bot=info".parse()?),
        )
        .init();

    info!("Starting vocabulary bot");

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => Arc::new(Database::new(url).await?),
        None => {
            warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };

    let translator = Arc::new(GoogleTranslator::new(
        &config.google_translate_api_key,
        &config.google_translate_api_url,
        Duration::from_secs(config.translate_timeout_secs),
    )?);

    // Long polls hold the connection open, so allow for the poll timeout on top
    let poll_timeout = Duration::from_secs(config.poll_timeout_secs);
    let telegram = TelegramClient::new(
        &config.telegram_bot_token,
        &config.telegram_api_url,
        poll_timeout + Duration::from_secs(10),
    )?;
    let transport = Arc::new(telegram.clone());

    let quiz = QuizEngine::new(
        store.clone(),
        ConfigStore::new(store.clone()),
        config.quiz_pool_scope,
    );
    let router = Router::new(store.clone(), translator, transport.clone(), quiz);
    let (queue, pool) = Dispatcher::new(router, store, transport).start(config.dispatch_workers);

    match config.transport {
        TransportMode::Polling => {
            telegram.delete_webhook().await?;
            let poller = Poller::new(telegram, poll_timeout);
            tokio::select! {
                result = poller.run(&queue) => result?,
                _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
            }
        }
        TransportMode::Webhook => {
            if let Some(url) = &config.webhook_url {
                telegram
                    .set_webhook(url, config.telegram_webhook_secret.as_deref())
                    .await?;
                info!("✓ Webhook registered at {}", url);
            }
            let state = AppState {
                queue: queue.clone(),
                webhook_secret: config.telegram_webhook_secret.clone(),
            };
            server::serve(state, config.port, async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received");
            })
            .await?;
        }
    }

    // Closing the last queue handle lets the workers finish what is queued
    drop(queue);
    pool.join().await;

    info!("Stopped");
    Ok(())
}
