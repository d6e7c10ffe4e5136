use color_eyre::eyre::eyre;
use color_eyre::Result;
use herald_core::{gc, Engine, EngineOptions, Enrichment, PollKind, PollerSettings, Store};
use herald_sources::{MediaServer, Notifier, TelegramNotifier};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::commands::load_context;
use crate::output::Output;
use crate::webhook;

pub async fn run_serve(bind_override: Option<String>, no_pollers: bool, out: &Output) -> Result<()> {
    let ctx = load_context()?;
    ctx.paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create data directories: {}", e))?;

    let store = Store::connect(&ctx.database_path())
        .await
        .map_err(|e| eyre!("Failed to open ledger database: {}", e))?;

    let server: Arc<dyn MediaServer> = Arc::new(ctx.server.clone());
    let notifiers = build_notifiers(&ctx, server.clone());
    if notifiers.is_empty() {
        out.warn("No notification transports configured; running in record-only mode");
    }

    let enrichment = Enrichment::from_config(&ctx.config.enrichment);
    let options = EngineOptions::from_notify_config(&ctx.config.notify);
    let engine = Arc::new(
        Engine::new(store.clone(), server.clone(), notifiers, enrichment, options)
            .await
            .map_err(|e| eyre!("Failed to build reconciliation engine: {}", e))?,
    );

    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();

    if no_pollers {
        info!("Pollers disabled, webhook only");
    } else {
        for (kind, interval_minutes) in [
            (PollKind::Movies, ctx.config.poll.movie_interval_minutes),
            (PollKind::Seasons, ctx.config.poll.series_interval_minutes),
            (
                PollKind::EpisodeQuality,
                ctx.config.poll.episode_quality_interval_minutes,
            ),
            (PollKind::Albums, ctx.config.poll.album_interval_minutes),
            (PollKind::Books, ctx.config.poll.book_interval_minutes),
            (
                PollKind::MusicVideos,
                ctx.config.poll.music_video_interval_minutes,
            ),
        ] {
            let settings = PollerSettings {
                interval: Duration::from_secs(interval_minutes * 60),
                page_size: ctx.config.poll.page_size,
                new_item_grace: chrono::Duration::minutes(ctx.config.poll.new_item_grace_minutes),
                wait_for_scan_idle: ctx.config.poll.wait_for_scan_idle,
                scan_idle_timeout: match ctx.config.poll.scan_idle_timeout_minutes {
                    0 => None,
                    minutes => Some(Duration::from_secs(minutes * 60)),
                },
            };
            tasks.push(tokio::spawn(herald_core::run_poller(
                engine.clone(),
                kind,
                settings,
                cancel.clone(),
            )));
        }

        tasks.push(tokio::spawn(gc::run_gc_loop(
            store.clone(),
            server.clone(),
            chrono::Duration::days(ctx.config.gc.grace_days),
            Duration::from_secs(ctx.config.gc.interval_hours * 3600),
            cancel.clone(),
        )));
    }

    let bind = bind_override.unwrap_or_else(|| ctx.config.server.bind.clone());
    let app = webhook::router(engine.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| eyre!("Failed to bind {}: {}", bind, e))?;
    out.success(format!("Webhook listening on http://{}", bind));

    let shutdown_cancel = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
            shutdown_cancel.cancel();
        })
        .await
        .map_err(|e| eyre!("Webhook server failed: {}", e))?;

    // Give loops a moment to observe cancellation before the pool closes
    cancel.cancel();
    for task in tasks {
        let _ = task.await;
    }
    store.close().await;
    out.info("Shut down cleanly");
    Ok(())
}

fn build_notifiers(
    ctx: &crate::commands::AppContext,
    server: Arc<dyn MediaServer>,
) -> Vec<Arc<dyn Notifier>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
    if ctx.config.telegram.enabled {
        match (
            ctx.credentials.get_telegram_bot_token(),
            ctx.config.telegram.chat_id.as_deref(),
        ) {
            (Some(token), Some(chat_id)) => {
                notifiers.push(Arc::new(TelegramNotifier::new(token, chat_id, server)));
            }
            _ => {
                warn!("Telegram enabled but bot token or chat id missing; transport skipped");
            }
        }
    }
    notifiers
}
