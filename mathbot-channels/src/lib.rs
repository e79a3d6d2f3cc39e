//! Mathbot Channels - a menu-driven formula calculator bot.
//!
//! A user picks one of seven formula variants, sends the arguments, and gets
//! the evaluated result back. Conversation state is kept per user.
//!
//! ## Architecture
//!
//! ```text
//! Telegram / CLI ─► listen ─► Dispatcher ─► per-user worker ─► DialogueEngine
//!                                                                   │
//! User ◄──────────── Channel::send ◄──── OutboundCommand ◄──────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod cli;
pub mod dialogue;
pub mod dispatcher;
pub mod formula;
pub mod message;
pub mod session;
pub mod telegram;
pub mod traits;

// Re-export commonly used types
pub use cli::CliChannel;
pub use dialogue::DialogueEngine;
pub use dispatcher::Dispatcher;
pub use formula::{Evaluation, FormulaError, FormulaRegistry, Variant, VariantSpec};
pub use message::{ChannelType, InboundEvent, OutboundCommand, OutgoingMessage};
pub use session::{ConversationState, DialogueState, SessionError, SessionStore, UserId};
pub use telegram::TelegramChannel;
pub use traits::{Channel, ChannelError, ChannelResult};

use anyhow::Context;
use mathbot_common::config::{Config, SessionsConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Capacity of the queue between a channel listener and the dispatcher.
const INBOUND_QUEUE: usize = 100;

/// Build the configured channel and run it until Ctrl-C or until the channel
/// stops listening.
pub async fn run(config: &Config, use_cli: bool) -> anyhow::Result<()> {
    let mut channel: Box<dyn Channel> = if use_cli {
        Box::new(CliChannel::new())
    } else {
        let telegram = &config.telegram;
        if !telegram.enabled {
            anyhow::bail!("Telegram channel is disabled; run with --cli for a local session");
        }
        let token = telegram
            .resolve_bot_token()
            .context("Failed to resolve Telegram bot token")?;
        tracing::info!(token = %mathbot_common::util::mask_token(&token), "Bot token loaded");
        Box::new(TelegramChannel::with_api_base(
            token,
            telegram.allowed_users.clone(),
            telegram.api_base.clone(),
        ))
    };

    channel
        .init()
        .await
        .with_context(|| format!("Failed to initialize {} channel", channel.name()))?;
    let channel: Arc<dyn Channel> = Arc::from(channel);

    let sessions = Arc::new(SessionStore::new());
    let engine = Arc::new(DialogueEngine::new(sessions.clone(), config.assets.clone()));
    let dispatcher = Arc::new(
        Dispatcher::new(engine, channel.clone())
            .with_worker_idle(Duration::from_secs(config.sessions.worker_idle_secs)),
    );

    let (tx, rx) = tokio::sync::mpsc::channel(INBOUND_QUEUE);
    let processor_handle = Dispatcher::spawn_processor(dispatcher.clone(), rx);
    let cleanup_handle = spawn_session_cleanup(sessions, &config.sessions);

    let listen_channel = channel.clone();
    let mut listener_handle = tokio::spawn(async move { listen_channel.listen(tx).await });

    tracing::info!(channel = channel.name(), "Mathbot v{} running", env!("CARGO_PKG_VERSION"));

    tokio::select! {
        result = &mut listener_handle => {
            match result {
                Ok(Ok(())) => tracing::info!("Listener finished"),
                Ok(Err(e)) => tracing::error!(error = %e, "Listener failed"),
                Err(e) => tracing::error!(error = %e, "Listener task panicked"),
            }
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            tracing::info!("Shutdown requested");
            listener_handle.abort();
        }
    }

    // The listener owned the inbound sender; once it is gone the processor drains.
    if let Err(e) = processor_handle.await {
        tracing::warn!(error = %e, "Dispatcher task ended abnormally");
    }
    dispatcher.shutdown().await;
    if let Some(handle) = cleanup_handle {
        handle.abort();
    }

    if let Err(e) = channel.shutdown().await {
        tracing::warn!(error = %e, "Channel shutdown failed");
    }

    Ok(())
}

/// Periodically evict idle sessions. Returns `None` when eviction is disabled.
pub fn spawn_session_cleanup(
    sessions: Arc<SessionStore>,
    config: &SessionsConfig,
) -> Option<JoinHandle<()>> {
    if config.idle_ttl_secs == 0 {
        return None;
    }

    let ttl = Duration::from_secs(config.idle_ttl_secs);
    let period = Duration::from_secs(config.cleanup_interval_secs.max(1));

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;

        loop {
            interval.tick().await;
            sessions.evict_idle(ttl);
        }
    }))
}
