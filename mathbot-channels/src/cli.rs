//! CLI channel adapter for interactive terminal sessions.
//!
//! Provides a simple stdin/stdout based channel for local testing and development.

use crate::message::{ChannelType, InboundEvent, OutboundCommand, OutgoingMessage};
use crate::session::UserId;
use crate::traits::{Channel, ChannelResult};
use async_trait::async_trait;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// User every terminal line is attributed to.
pub const LOCAL_USER: &str = "local";

/// CLI channel - stdin/stdout, always available, zero deps.
pub struct CliChannel {
    user_id: UserId,
}

impl CliChannel {
    /// Create a new CLI channel.
    pub fn new() -> Self {
        Self {
            user_id: UserId::from(LOCAL_USER),
        }
    }

    /// Read lines from `reader` until EOF or `/quit`, forwarding each as an event.
    async fn forward_lines<R>(&self, reader: R, tx: &mpsc::Sender<InboundEvent>) -> ChannelResult<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            if line == "/quit" || line == "/exit" {
                break;
            }

            let event = InboundEvent::text(ChannelType::Cli, self.user_id.clone(), line);
            if tx.send(event).await.is_err() {
                break;
            }
        }
        Ok(())
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal rendering of an outbound command.
pub fn render(command: &OutboundCommand) -> String {
    match command {
        OutboundCommand::SendText { text } => text.clone(),
        OutboundCommand::SendMenu { prompt, buttons } => {
            let keys: Vec<String> = buttons.iter().map(|b| format!("[{b}]")).collect();
            format!("{prompt}\n{}", keys.join(" "))
        }
        OutboundCommand::SendImage {
            image_path,
            caption,
        } => {
            if caption.is_empty() {
                format!("[Image: {image_path}]")
            } else {
                format!("[Image: {image_path}] {caption}")
            }
        }
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &'static str {
        "cli"
    }

    async fn init(&mut self) -> ChannelResult<()> {
        Ok(())
    }

    async fn send(&self, message: &OutgoingMessage) -> ChannelResult<String> {
        println!("{}", render(&message.command));
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn listen(&self, tx: mpsc::Sender<InboundEvent>) -> ChannelResult<()> {
        self.forward_lines(BufReader::new(io::stdin()), &tx).await
    }
}
