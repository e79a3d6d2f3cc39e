//! Channel traits for implementing messaging adapters.

use crate::message::{InboundEvent, OutgoingMessage};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Channel error type.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Message send failed: {0}")]
    SendFailed(String),

    #[error("Asset unavailable: {path}: {reason}")]
    Asset { path: String, reason: String },

    #[error("Channel not ready")]
    NotReady,
}

/// Channel adapter trait.
///
/// A channel turns platform updates into [`InboundEvent`]s and carries the
/// engine's replies back to the user.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name.
    fn name(&self) -> &'static str;

    /// Initialize the channel (connect, authenticate, etc.).
    async fn init(&mut self) -> ChannelResult<()>;

    /// Deliver one outbound message. Returns a channel-specific message ID.
    async fn send(&self, message: &OutgoingMessage) -> ChannelResult<String>;

    /// Listen for incoming messages until the source closes or `tx` is dropped.
    async fn listen(&self, tx: mpsc::Sender<InboundEvent>) -> ChannelResult<()>;

    /// Check if the channel is healthy.
    async fn health_check(&self) -> ChannelResult<()> {
        Ok(())
    }

    /// Shutdown the channel gracefully.
    async fn shutdown(&self) -> ChannelResult<()> {
        Ok(())
    }
}
