//! Dialogue engine.
//!
//! Drives the two-state conversation for every user:
//!
//! ```text
//!              "/start" (any state)
//!        ┌──────────────────────────────┐
//!        ▼                              │
//! AwaitingVariant ── "1".."7" ──► AwaitingArguments
//!        ▲                              │
//!        └──── well-formed numbers ─────┘
//!              (result sent)
//! ```
//!
//! Bad input never moves the conversation forward: an invalid variant number
//! re-sends the menu, a malformed argument line re-sends the "enter N numbers"
//! prompt. The engine only produces [`OutboundCommand`]s; delivering them is
//! the channel's job.

use crate::formula::{FormulaRegistry, Variant};
use crate::message::{InboundEvent, OutboundCommand};
use crate::session::{ConversationState, DialogueState, SessionStore};
use mathbot_common::config::AssetsConfig;
use std::sync::Arc;

/// The only supported command, matched case-insensitively.
pub const RESET_COMMAND: &str = "/start";

/// Text shown above the variant keyboard.
pub const MENU_PROMPT: &str = "Pick a variant";

/// Conversation state machine over the shared session store.
pub struct DialogueEngine {
    sessions: Arc<SessionStore>,
    registry: FormulaRegistry,
    assets: AssetsConfig,
}

impl DialogueEngine {
    pub fn new(sessions: Arc<SessionStore>, assets: AssetsConfig) -> Self {
        Self {
            sessions,
            registry: FormulaRegistry::new(),
            assets,
        }
    }

    /// Engine with a private session store and default asset paths.
    pub fn standalone() -> Self {
        Self::new(Arc::new(SessionStore::new()), AssetsConfig::default())
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one inbound message for its sender.
    ///
    /// The sender's session is locked for the whole transition, so two
    /// messages from the same user are never applied concurrently.
    pub async fn handle(&self, event: &InboundEvent) -> Vec<OutboundCommand> {
        let session = self.sessions.get_or_create(&event.user_id);
        let mut state = session.lock().await;
        state.touch();
        self.transition(&mut state, event)
    }

    /// Apply one message to a conversation and return what to send back.
    pub fn transition(
        &self,
        state: &mut ConversationState,
        event: &InboundEvent,
    ) -> Vec<OutboundCommand> {
        let before = state.state();

        let commands = if event.is_command {
            self.on_command(state, &event.text)
        } else {
            match before {
                DialogueState::AwaitingVariant => self.on_variant_choice(state, &event.text),
                DialogueState::AwaitingArguments {
                    variant,
                    expected_args,
                } => self.on_arguments(state, variant, expected_args, &event.text),
            }
        };

        tracing::debug!(
            user_id = %event.user_id,
            from = before.name(),
            to = state.state().name(),
            variant = state.selected_variant(),
            replies = commands.len(),
            "Dialogue transition"
        );

        commands
    }

    /// The variant keyboard.
    pub fn menu(&self) -> OutboundCommand {
        OutboundCommand::SendMenu {
            prompt: MENU_PROMPT.to_string(),
            buttons: Variant::ALL.iter().map(ToString::to_string).collect(),
        }
    }

    fn on_command(&self, state: &mut ConversationState, text: &str) -> Vec<OutboundCommand> {
        if !text.eq_ignore_ascii_case(RESET_COMMAND) {
            return vec![OutboundCommand::text(format!(
                "\"{RESET_COMMAND}\" is the only available command"
            ))];
        }

        state.reset();
        vec![
            OutboundCommand::SendImage {
                image_path: self.assets.picker_image_path(),
                caption: String::new(),
            },
            self.menu(),
        ]
    }

    fn on_variant_choice(&self, state: &mut ConversationState, text: &str) -> Vec<OutboundCommand> {
        let Some(variant) = text
            .parse::<i64>()
            .ok()
            .and_then(|n| Variant::from_number(n).ok())
        else {
            return vec![self.menu()];
        };

        state.select(variant);
        let spec = variant.spec();
        vec![OutboundCommand::SendImage {
            image_path: self.assets.variant_image_path(variant.number()),
            caption: format!(
                "Enter real numbers for {} accordingly, separated by spaces",
                spec.argument_list()
            ),
        }]
    }

    fn on_arguments(
        &self,
        state: &mut ConversationState,
        variant: Variant,
        expected_args: usize,
        text: &str,
    ) -> Vec<OutboundCommand> {
        let tokens = split_arguments(text);
        let Some(args) = parse_arguments(&tokens, expected_args) else {
            return vec![reprompt(expected_args)];
        };

        let result = self
            .registry
            .get(i64::from(variant.number()))
            .and_then(|spec| spec.evaluate(&args));
        debug_assert!(result.is_ok(), "validated input rejected by registry: {result:?}");

        let evaluation = match result {
            Ok(evaluation) => evaluation,
            Err(e) => {
                tracing::error!(error = %e, "Registry rejected a validated variant or arguments");
                state.reset();
                return vec![self.menu()];
            }
        };

        if evaluation.is_undefined() {
            tracing::info!(variant = variant.number(), ?evaluation, "Formula result undefined");
        }

        state.reset();
        vec![
            OutboundCommand::text(format!(
                "Variant: {}\nArguments: {}\nResult: {}",
                variant.number(),
                tokens.join(", "),
                evaluation
            )),
            self.menu(),
        ]
    }
}

/// Prompt asking for exactly `n` numbers.
fn reprompt(n: usize) -> OutboundCommand {
    OutboundCommand::text(format!("Enter {n} real numbers separated by spaces"))
}

/// Split an argument line on single spaces.
///
/// Trailing empty tokens are dropped, inner ones are kept: `"1 2 "` yields two
/// tokens while `"1  2"` yields three, one of them empty.
pub fn split_arguments(text: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = text.split(' ').collect();
    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    tokens
}

/// Parse exactly `expected` tokens as real numbers.
///
/// The count is checked before any token is parsed.
pub fn parse_arguments(tokens: &[&str], expected: usize) -> Option<Vec<f64>> {
    if tokens.len() != expected {
        return None;
    }
    tokens.iter().map(|t| t.trim().parse::<f64>().ok()).collect()
}
