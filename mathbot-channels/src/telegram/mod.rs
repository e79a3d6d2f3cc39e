//! Telegram channel adapter.
//!
//! Provides the `TelegramChannel` implementation for receiving and sending messages
//! through the Telegram Bot API.

use crate::message::{ChannelType, InboundEvent, OutboundCommand, OutgoingMessage};
use crate::traits::{Channel, ChannelError, ChannelResult};
use async_trait::async_trait;
use mathbot_common::util::split_message;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

/// Maximum message length accepted by `sendMessage`.
const MAX_MESSAGE_LEN: usize = 4096;

/// Long-poll timeout passed to `getUpdates`, in seconds.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed poll.
const POLL_BACKOFF: Duration = Duration::from_secs(5);

/// Telegram channel - long-polls the Bot API for updates.
pub struct TelegramChannel {
    bot_token: String,
    allowed_users: Vec<String>,
    api_base: String,
    client: reqwest::Client,
    poll_backoff: Duration,
}

impl TelegramChannel {
    /// Create a new Telegram channel against the public Bot API.
    pub fn new(bot_token: String, allowed_users: Vec<String>) -> Self {
        Self::with_api_base(bot_token, allowed_users, "https://api.telegram.org")
    }

    /// Create a channel against a custom Bot API server.
    pub fn with_api_base(
        bot_token: String,
        allowed_users: Vec<String>,
        api_base: impl Into<String>,
    ) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            bot_token,
            allowed_users,
            api_base,
            client,
            poll_backoff: POLL_BACKOFF,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    fn is_user_allowed(&self, identity: &str) -> bool {
        self.allowed_users.iter().any(|u| u == "*" || u == identity)
    }

    fn is_any_user_allowed<'a, I>(&self, identities: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        identities.into_iter().any(|id| self.is_user_allowed(id))
    }

    /// Turn one `getUpdates` entry into an inbound event.
    ///
    /// Returns `None` for anything that is not a text message from an
    /// allowed user.
    fn parse_update(&self, update: &serde_json::Value) -> Option<InboundEvent> {
        let message = update.get("message")?;
        let text = message.get("text")?.as_str()?;

        let chat_id = message.get("chat")?.get("id")?.as_i64()?.to_string();

        let from = message.get("from")?;
        let user_id = from.get("id")?.as_i64()?.to_string();
        let username = from.get("username").and_then(|u| u.as_str());

        let identities = [Some(user_id.as_str()), username];
        if !self.is_any_user_allowed(identities.into_iter().flatten()) {
            tracing::warn!(
                user_id = %user_id,
                username = username.unwrap_or("unknown"),
                "Telegram: ignoring message from unauthorized user"
            );
            return None;
        }

        let mut event = InboundEvent::new(
            ChannelType::Telegram,
            user_id,
            chat_id,
            text,
            is_bot_command(message),
        );
        if let Some(message_id) = message.get("message_id").and_then(serde_json::Value::as_i64) {
            event.id = message_id.to_string();
        }
        Some(event)
    }

    async fn post_json(&self, method: &str, body: &serde_json::Value) -> ChannelResult<()> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed(format!("{method} failed: {err}")));
        }
        Ok(())
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> ChannelResult<()> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            let body = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });
            self.post_json("sendMessage", &body).await?;
        }
        Ok(())
    }

    async fn send_menu(&self, chat_id: &str, prompt: &str, buttons: &[String]) -> ChannelResult<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": prompt,
            "reply_markup": reply_keyboard(buttons),
        });
        self.post_json("sendMessage", &body).await
    }

    async fn send_photo(&self, chat_id: &str, image_path: &str, caption: &str) -> ChannelResult<()> {
        let path = Path::new(image_path);
        let bytes = tokio::fs::read(path).await.map_err(|e| ChannelError::Asset {
            path: image_path.to_string(),
            reason: e.to_string(),
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image.png")
            .to_string();

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", Part::bytes(bytes).file_name(file_name));
        if !caption.is_empty() {
            form = form.text("caption", caption.to_string());
        }

        let resp = self
            .client
            .post(self.api_url("sendPhoto"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed(format!("sendPhoto failed: {err}")));
        }
        Ok(())
    }

    async fn get_me(&self) -> Result<serde_json::Value, reqwest::Error> {
        self.client
            .get(self.api_url("getMe"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

/// Single-row, single-use reply keyboard.
fn reply_keyboard(buttons: &[String]) -> serde_json::Value {
    let row: Vec<serde_json::Value> = buttons
        .iter()
        .map(|text| serde_json::json!({ "text": text }))
        .collect();

    serde_json::json!({
        "keyboard": [row],
        "resize_keyboard": true,
        "one_time_keyboard": true,
    })
}

/// A message is a command when Telegram tags a `bot_command` at offset 0.
///
/// Text alone is not enough: a bare `/` or `/ 1` carries no entity and is
/// treated as ordinary input.
fn is_bot_command(message: &serde_json::Value) -> bool {
    message
        .get("entities")
        .and_then(serde_json::Value::as_array)
        .is_some_and(|entities| {
            entities.iter().any(|e| {
                e.get("type").and_then(|t| t.as_str()) == Some("bot_command")
                    && e.get("offset").and_then(serde_json::Value::as_i64) == Some(0)
            })
        })
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn init(&mut self) -> ChannelResult<()> {
        // Verify bot token by calling getMe
        let me = self.get_me().await.map_err(|e| {
            if e.is_status() {
                ChannelError::Auth(format!("Invalid bot token: {e}"))
            } else {
                ChannelError::Connection(e.to_string())
            }
        })?;

        let username = me
            .get("result")
            .and_then(|r| r.get("username"))
            .and_then(|u| u.as_str())
            .unwrap_or("unknown");

        tracing::info!(bot = username, "Telegram channel initialized");
        Ok(())
    }

    async fn send(&self, message: &OutgoingMessage) -> ChannelResult<String> {
        let chat_id = message.chat_id.as_str();

        match &message.command {
            OutboundCommand::SendText { text } => self.send_text(chat_id, text).await?,
            OutboundCommand::SendMenu { prompt, buttons } => {
                self.send_menu(chat_id, prompt, buttons).await?;
            }
            OutboundCommand::SendImage {
                image_path,
                caption,
            } => self.send_photo(chat_id, image_path, caption).await?,
        }

        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn listen(&self, tx: mpsc::Sender<InboundEvent>) -> ChannelResult<()> {
        let mut offset: i64 = 0;

        tracing::info!("Telegram channel listening for messages...");

        loop {
            let body = serde_json::json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"]
            });

            let resp = match self
                .client
                .post(self.api_url("getUpdates"))
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    tokio::time::sleep(self.poll_backoff).await;
                    continue;
                }
            };

            let data: serde_json::Value = match resp.json().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Telegram parse error: {e}");
                    tokio::time::sleep(self.poll_backoff).await;
                    continue;
                }
            };

            if data.get("ok").and_then(serde_json::Value::as_bool) == Some(false) {
                let description = data
                    .get("description")
                    .and_then(|d| d.as_str())
                    .unwrap_or("unknown error");
                tracing::warn!("Telegram getUpdates rejected: {description}");
                tokio::time::sleep(self.poll_backoff).await;
                continue;
            }

            let Some(results) = data.get("result").and_then(serde_json::Value::as_array) else {
                continue;
            };

            for update in results {
                if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64) {
                    offset = uid + 1;
                }

                let Some(event) = self.parse_update(update) else {
                    continue;
                };

                tracing::info!(
                    trace_id = %event.trace_id,
                    message_id = %event.id,
                    chat_id = %event.chat_id,
                    user_id = %event.user_id,
                    "Telegram message received"
                );

                if tx.send(event).await.is_err() {
                    tracing::info!("Inbound queue closed, Telegram listener stopping");
                    return Ok(());
                }
            }
        }
    }

    async fn health_check(&self) -> ChannelResult<()> {
        match self.get_me().await {
            Ok(_) => Ok(()),
            Err(e) if e.is_status() => Err(ChannelError::NotReady),
            Err(e) => Err(ChannelError::Connection(e.to_string())),
        }
    }

    async fn shutdown(&self) -> ChannelResult<()> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(text: &str, entities: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "update_id": 10,
            "message": {
                "message_id": 77,
                "from": { "id": 4242, "username": "alice" },
                "chat": { "id": 4242, "type": "private" },
                "text": text,
                "entities": entities
            }
        })
    }

    #[test]
    fn telegram_channel_name() {
        let ch = TelegramChannel::new("fake-token".into(), vec!["*".into()]);
        assert_eq!(ch.name(), "telegram");
    }

    #[test]
    fn telegram_api_url() {
        let ch = TelegramChannel::new("123:ABC".into(), vec![]);
        assert_eq!(
            ch.api_url("getMe"),
            "https://api.telegram.org/bot123:ABC/getMe"
        );

        let local = TelegramChannel::with_api_base("t".into(), vec![], "http://localhost:8081/");
        assert_eq!(local.api_url("sendPhoto"), "http://localhost:8081/bott/sendPhoto");
    }

    #[test]
    fn telegram_user_allowed_wildcard() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        assert!(ch.is_user_allowed("anyone"));
    }

    #[test]
    fn telegram_user_allowed_specific() {
        let ch = TelegramChannel::new("t".into(), vec!["alice".into(), "4242".into()]);
        assert!(ch.is_user_allowed("alice"));
        assert!(ch.is_any_user_allowed(["eve", "4242"]));
        assert!(!ch.is_user_allowed("eve"));
    }

    #[test]
    fn parse_text_update() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        let event = ch.parse_update(&update("3", serde_json::json!([]))).unwrap();

        assert_eq!(event.user_id.as_str(), "4242");
        assert_eq!(event.chat_id, "4242");
        assert_eq!(event.text, "3");
        assert_eq!(event.id, "77");
        assert!(!event.is_command);
        assert_eq!(event.channel_type, ChannelType::Telegram);
    }

    #[test]
    fn parse_command_from_entity() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        let entities = serde_json::json!([{ "type": "bot_command", "offset": 0, "length": 6 }]);
        let event = ch.parse_update(&update("/start", entities)).unwrap();
        assert!(event.is_command);
    }

    #[test]
    fn command_detection_requires_entity() {
        let untagged = serde_json::json!({ "text": "/help" });
        assert!(!is_bot_command(&untagged));

        let mid = serde_json::json!({ "entities": [{ "type": "bot_command", "offset": 2 }] });
        assert!(!is_bot_command(&mid));
    }

    #[test]
    fn bare_slash_is_plain_text() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        let event = ch.parse_update(&update("/", serde_json::json!([]))).unwrap();
        assert!(!event.is_command);

        let engine = crate::DialogueEngine::standalone();
        let mut state = crate::ConversationState::new(event.user_id.clone());
        assert_eq!(engine.transition(&mut state, &event), vec![engine.menu()]);
    }

    #[test]
    fn parse_ignores_non_text_and_unauthorized() {
        let open = TelegramChannel::new("t".into(), vec!["*".into()]);
        let sticker = serde_json::json!({
            "update_id": 11,
            "message": {
                "from": { "id": 1 },
                "chat": { "id": 1 },
                "sticker": { "file_id": "x" }
            }
        });
        assert!(open.parse_update(&sticker).is_none());

        let closed = TelegramChannel::new("t".into(), vec!["bob".into()]);
        assert!(closed.parse_update(&update("1", serde_json::json!([]))).is_none());
    }

    #[test]
    fn reply_keyboard_is_single_use_row() {
        let buttons: Vec<String> = (1..=7).map(|n| n.to_string()).collect();
        let markup = reply_keyboard(&buttons);

        assert_eq!(markup["keyboard"].as_array().unwrap().len(), 1);
        assert_eq!(markup["keyboard"][0].as_array().unwrap().len(), 7);
        assert_eq!(markup["keyboard"][0][6]["text"], "7");
        assert_eq!(markup["resize_keyboard"], true);
        assert_eq!(markup["one_time_keyboard"], true);
    }

    #[tokio::test]
    async fn send_photo_reports_missing_asset() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        let err = ch
            .send_photo("1", "/nonexistent/mathbot/variants.png", "")
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::Asset { .. }));
    }

    // ------------------------------------------------------------------------
    // Bot API round trips against a mock server
    // ------------------------------------------------------------------------

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const TOKEN: &str = "123:ABC";

    fn mock_channel(server: &MockServer) -> TelegramChannel {
        let mut ch = TelegramChannel::with_api_base(TOKEN.into(), vec!["*".into()], server.uri());
        ch.poll_backoff = Duration::from_millis(10);
        ch
    }

    fn ok_with(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": result }))
    }

    async fn requests_to(server: &MockServer, api_method: &str) -> Vec<Request> {
        let suffix = format!("/{api_method}");
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path().ends_with(&suffix))
            .collect()
    }

    async fn json_bodies(server: &MockServer, api_method: &str) -> Vec<serde_json::Value> {
        requests_to(server, api_method)
            .await
            .iter()
            .map(|r| r.body_json::<serde_json::Value>().unwrap())
            .collect()
    }

    async fn wait_for_offset(server: &MockServer, offset: i64) -> Vec<i64> {
        for _ in 0..300 {
            let offsets: Vec<i64> = json_bodies(server, "getUpdates")
                .await
                .iter()
                .filter_map(|b| b["offset"].as_i64())
                .collect();
            if offsets.contains(&offset) {
                return offsets;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no getUpdates request with offset {offset}");
    }

    async fn mount_idle_poll(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/getUpdates")))
            .respond_with(ok_with(json!([])).set_delay(Duration::from_millis(50)))
            .mount(server)
            .await;
    }

    fn outgoing(command: OutboundCommand) -> OutgoingMessage {
        InboundEvent::new(ChannelType::Telegram, "4242", "4242", "x", false).reply(command)
    }

    #[tokio::test]
    async fn poll_advances_offset_past_last_update() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/getUpdates")))
            .and(body_partial_json(json!({ "offset": 0 })))
            .respond_with(ok_with(json!([update("3", json!([]))])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_idle_poll(&server).await;

        let ch = mock_channel(&server);
        let (tx, mut rx) = mpsc::channel(4);
        let listener = tokio::spawn(async move { ch.listen(tx).await });

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.text, "3");
        assert_eq!(event.id, "77");

        let offsets = wait_for_offset(&server, 11).await;
        assert_eq!(offsets[0], 0);
        assert!(offsets[1..].iter().all(|&o| o == 11), "offsets {offsets:?}");

        let first = &json_bodies(&server, "getUpdates").await[0];
        assert_eq!(first["timeout"], 30);
        assert_eq!(first["allowed_updates"], json!(["message"]));

        listener.abort();
    }

    #[tokio::test]
    async fn rejected_poll_backs_off_and_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/getUpdates")))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({ "ok": false, "description": "Conflict" })),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/getUpdates")))
            .and(body_partial_json(json!({ "offset": 0 })))
            .respond_with(ok_with(json!([update("5", json!([]))])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_idle_poll(&server).await;

        let ch = mock_channel(&server);
        let (tx, mut rx) = mpsc::channel(4);
        let listener = tokio::spawn(async move { ch.listen(tx).await });

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.text, "5");

        // Rejected poll is retried with the same offset.
        let offsets = wait_for_offset(&server, 11).await;
        assert_eq!(offsets[..2], [0_i64, 0]);

        listener.abort();
    }

    #[tokio::test]
    async fn listen_stops_when_queue_closes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/getUpdates")))
            .respond_with(ok_with(json!([update("1", json!([]))])))
            .mount(&server)
            .await;

        let ch = mock_channel(&server);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let result = tokio::time::timeout(Duration::from_secs(5), ch.listen(tx))
            .await
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn send_text_splits_long_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .respond_with(ok_with(json!({ "message_id": 1 })))
            .expect(2)
            .mount(&server)
            .await;

        let ch = mock_channel(&server);
        let text = "word ".repeat(1000);
        ch.send(&outgoing(OutboundCommand::text(text.trim_end())))
            .await
            .unwrap();

        let bodies = json_bodies(&server, "sendMessage").await;
        assert_eq!(bodies.len(), 2);
        let mut words = 0;
        for body in &bodies {
            assert_eq!(body["chat_id"], "4242");
            assert!(body.get("reply_markup").is_none());
            let chunk = body["text"].as_str().unwrap();
            assert!(chunk.chars().count() <= MAX_MESSAGE_LEN);
            words += chunk.split_whitespace().filter(|w| *w == "word").count();
        }
        assert_eq!(words, 1000);
    }

    #[tokio::test]
    async fn send_menu_posts_reply_keyboard() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .respond_with(ok_with(json!({ "message_id": 2 })))
            .expect(1)
            .mount(&server)
            .await;

        let ch = mock_channel(&server);
        let menu = OutboundCommand::SendMenu {
            prompt: "Pick a variant".into(),
            buttons: vec!["1".into(), "2".into()],
        };
        ch.send(&outgoing(menu)).await.unwrap();

        let bodies = json_bodies(&server, "sendMessage").await;
        assert_eq!(
            bodies,
            vec![json!({
                "chat_id": "4242",
                "text": "Pick a variant",
                "reply_markup": {
                    "keyboard": [[{ "text": "1" }, { "text": "2" }]],
                    "resize_keyboard": true,
                    "one_time_keyboard": true
                }
            })]
        );
    }

    #[tokio::test]
    async fn send_photo_uploads_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendPhoto")))
            .respond_with(ok_with(json!({ "message_id": 3 })))
            .expect(2)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("4.png");
        std::fs::write(&image, b"fake-png-bytes").unwrap();
        let image_path = image.to_string_lossy().into_owned();

        let ch = mock_channel(&server);
        ch.send(&outgoing(OutboundCommand::SendImage {
            image_path: image_path.clone(),
            caption: String::new(),
        }))
        .await
        .unwrap();
        ch.send(&outgoing(OutboundCommand::SendImage {
            image_path,
            caption: "Enter real numbers for a, x accordingly, separated by spaces".into(),
        }))
        .await
        .unwrap();

        let uploads: Vec<String> = requests_to(&server, "sendPhoto")
            .await
            .iter()
            .map(|r| String::from_utf8_lossy(&r.body).into_owned())
            .collect();
        assert_eq!(uploads.len(), 2);

        for body in &uploads {
            assert!(body.contains("name=\"chat_id\""));
            assert!(body.contains("4242"));
            assert!(body.contains("name=\"photo\"; filename=\"4.png\""));
            assert!(body.contains("fake-png-bytes"));
        }
        assert!(!uploads[0].contains("name=\"caption\""));
        assert!(uploads[1].contains("name=\"caption\""));
        assert!(uploads[1].contains("Enter real numbers for a, x accordingly"));
    }

    #[tokio::test]
    async fn send_reports_api_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "ok": false, "description": "chat not found" })),
            )
            .mount(&server)
            .await;

        let ch = mock_channel(&server);
        let err = ch
            .send(&outgoing(OutboundCommand::text("hi")))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::SendFailed(ref m) if m.contains("chat not found")));
    }

    #[tokio::test]
    async fn init_checks_token_with_get_me() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/bot{TOKEN}/getMe")))
            .respond_with(ok_with(json!({ "id": 1, "username": "math_bot" })))
            .mount(&server)
            .await;
        let mut ch = mock_channel(&server);
        assert!(ch.init().await.is_ok());

        let rejecting = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/bot{TOKEN}/getMe")))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "ok": false, "description": "Unauthorized" })),
            )
            .mount(&rejecting)
            .await;
        let mut ch = mock_channel(&rejecting);
        assert!(matches!(ch.init().await, Err(ChannelError::Auth(_))));
    }
}
