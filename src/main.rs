use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

use cinema_bots::bot::{AdminConversation, ConversationEngine, LookupConversation, Messenger};
use cinema_bots::catalog::CatalogStore;
use cinema_bots::config::{AppConfig, LogFormat};
use cinema_bots::instance_guard::InstanceGuard;
use cinema_bots::localization::Localizer;
use cinema_bots::webhook::{build_router, WebhookState, ADMIN_BOT_PATH, LOOKUP_BOT_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;

    init_tracing(config.log_format);
    info!("Starting cinema bots");

    // Both guards live until main returns
    let _lookup_guard = InstanceGuard::acquire(&config.lock_dir, "cinemabot")?;
    let _admin_guard = InstanceGuard::acquire(&config.lock_dir, "adminbot")?;

    let l10n = Arc::new(Localizer::new().context("Failed to load localization resources")?);

    info!(path = %config.catalog_path.display(), "Using catalog document");
    let store = Arc::new(CatalogStore::new(&config.catalog_path, config.seed_admin_id));

    let lookup_bot = Bot::new(&config.lookup_bot_token);
    let admin_bot = Bot::new(&config.admin_bot_token);

    if let Some(base_url) = &config.webhook_base_url {
        register_webhook(&lookup_bot, base_url, LOOKUP_BOT_PATH).await?;
        register_webhook(&admin_bot, base_url, ADMIN_BOT_PATH).await?;
    }

    let lookup_messenger: Arc<dyn Messenger> = Arc::new(lookup_bot);
    let admin_messenger: Arc<dyn Messenger> = Arc::new(admin_bot);

    let lookup = ConversationEngine::with_in_memory_sessions(
        LookupConversation::new(Arc::clone(&store), Arc::clone(&l10n)),
        lookup_messenger,
    );
    let admin = ConversationEngine::with_in_memory_sessions(
        AdminConversation::new(Arc::clone(&store), Arc::clone(&l10n), Arc::clone(&admin_messenger)),
        admin_messenger,
    );

    let app = build_router(WebhookState {
        lookup: Arc::new(lookup),
        admin: Arc::new(admin),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "Webhook server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Cinema bots stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Plain => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn register_webhook(bot: &Bot, base_url: &str, path: &str) -> Result<()> {
    let url = Url::parse(&format!("{base_url}{path}"))
        .with_context(|| format!("Invalid webhook URL {base_url}{path}"))?;
    bot.set_webhook(url.clone())
        .await
        .with_context(|| format!("Failed to register webhook {url}"))?;
    info!(%url, "Webhook registered");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
