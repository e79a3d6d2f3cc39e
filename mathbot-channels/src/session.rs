//! Per-user conversation state and the store that owns it.
//!
//! A [`ConversationState`] is created lazily the first time a user writes to
//! the bot and lives until it is evicted for inactivity. The store hands out
//! `Arc<Mutex<_>>` handles so that one user's messages are applied one at a
//! time while different users proceed in parallel.

use crate::formula::Variant;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Stable identifier of a remote user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid variant {0}: allowed values are in the range [0-7]")]
    InvalidVariant(i64),
}

/// Where a user is in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogueState {
    /// No variant chosen yet; the next plain message should be 1..=7.
    #[default]
    AwaitingVariant,
    /// A variant is chosen; the next plain message should hold its arguments.
    AwaitingArguments {
        variant: Variant,
        expected_args: usize,
    },
}

impl DialogueState {
    /// State for a freshly selected variant.
    pub fn for_variant(variant: Variant) -> Self {
        Self::AwaitingArguments {
            variant,
            expected_args: variant.spec().required_arg_count(),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::AwaitingVariant => "awaiting_variant",
            Self::AwaitingArguments { .. } => "awaiting_arguments",
        }
    }
}

/// Conversation state of a single user.
#[derive(Debug, Clone)]
pub struct ConversationState {
    user_id: UserId,
    state: DialogueState,
    last_active: Instant,
}

impl ConversationState {
    /// New session waiting for a variant.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            state: DialogueState::AwaitingVariant,
            last_active: Instant::now(),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub const fn state(&self) -> DialogueState {
        self.state
    }

    /// Selected variant number, 0 when none is selected.
    pub const fn selected_variant(&self) -> u8 {
        match self.state {
            DialogueState::AwaitingVariant => 0,
            DialogueState::AwaitingArguments { variant, .. } => variant.number(),
        }
    }

    /// Selected variant, if any.
    pub const fn variant(&self) -> Option<Variant> {
        match self.state {
            DialogueState::AwaitingVariant => None,
            DialogueState::AwaitingArguments { variant, .. } => Some(variant),
        }
    }

    /// Number of arguments the selected variant needs, 0 when none is selected.
    pub const fn expected_arg_count(&self) -> usize {
        match self.state {
            DialogueState::AwaitingVariant => 0,
            DialogueState::AwaitingArguments { expected_args, .. } => expected_args,
        }
    }

    /// Select variant `v` (0 clears the selection).
    ///
    /// Values outside 0..=7 are rejected and leave the state untouched.
    pub fn set_variant(&mut self, v: i64) -> Result<(), SessionError> {
        self.state = match v {
            0 => DialogueState::AwaitingVariant,
            _ => {
                let variant =
                    Variant::from_number(v).map_err(|_| SessionError::InvalidVariant(v))?;
                DialogueState::for_variant(variant)
            }
        };
        Ok(())
    }

    /// Select a known variant.
    pub fn select(&mut self, variant: Variant) {
        self.state = DialogueState::for_variant(variant);
    }

    /// Back to waiting for a variant.
    pub fn reset(&mut self) {
        self.state = DialogueState::AwaitingVariant;
    }

    /// Record activity for idle eviction.
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// Time since the last recorded activity.
    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }
}

/// Shared handle to one user's conversation state.
pub type SessionHandle = Arc<Mutex<ConversationState>>;

/// Concurrent map from user to conversation state.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, SessionHandle>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the user's session, creating it on first contact.
    ///
    /// Lookup and insertion happen under the same map shard lock, so two
    /// concurrent first messages from one user share a single state.
    pub fn get_or_create(&self, user_id: &UserId) -> SessionHandle {
        if let Some(existing) = self.sessions.get(user_id) {
            return existing.value().clone();
        }

        self.sessions
            .entry(user_id.clone())
            .or_insert_with(|| {
                tracing::debug!(user_id = %user_id, "Creating conversation session");
                Arc::new(Mutex::new(ConversationState::new(user_id.clone())))
            })
            .value()
            .clone()
    }

    /// Existing session without creating one.
    pub fn get(&self, user_id: &UserId) -> Option<SessionHandle> {
        self.sessions.get(user_id).map(|s| s.value().clone())
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.sessions.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle for at least `ttl`. Returns how many were removed.
    ///
    /// Sessions that are locked or referenced outside the store are in use
    /// and always kept.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();

        self.sessions.retain(|_, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(state) => state.idle_for() < ttl,
                Err(_) => true,
            }
        });

        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::info!(evicted, remaining = self.sessions.len(), "Evicted idle sessions");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_awaits_variant() {
        let state = ConversationState::new(UserId::from("u1"));
        assert_eq!(state.state(), DialogueState::AwaitingVariant);
        assert_eq!(state.selected_variant(), 0);
        assert_eq!(state.expected_arg_count(), 0);
        assert_eq!(state.variant(), None);
    }

    #[test]
    fn set_variant_derives_expected_count() {
        let mut state = ConversationState::new(UserId::from("u1"));
        let expected = [(1, 5), (2, 4), (3, 4), (4, 2), (5, 5), (6, 1), (7, 1)];
        for (v, count) in expected {
            state.set_variant(v).unwrap();
            assert_eq!(i64::from(state.selected_variant()), v);
            assert_eq!(state.expected_arg_count(), count);
        }

        state.set_variant(0).unwrap();
        assert_eq!(state.state(), DialogueState::AwaitingVariant);
        assert_eq!(state.expected_arg_count(), 0);
    }

    #[test]
    fn set_variant_out_of_range_leaves_state_unchanged() {
        let mut state = ConversationState::new(UserId::from("u1"));
        state.set_variant(4).unwrap();
        let before = state.state();

        for v in [-1, 8, 42, i64::MIN, i64::MAX] {
            assert_eq!(state.set_variant(v), Err(SessionError::InvalidVariant(v)));
            assert_eq!(state.state(), before);
        }
    }

    #[test]
    fn reset_clears_selection() {
        let mut state = ConversationState::new(UserId::from("u1"));
        state.select(Variant::V6);
        assert_eq!(state.state().name(), "awaiting_arguments");
        state.reset();
        assert_eq!(state.selected_variant(), 0);
        assert_eq!(state.state().name(), "awaiting_variant");
    }

    #[tokio::test]
    async fn get_or_create_returns_same_instance() {
        let store = SessionStore::new();
        let user = UserId::from(1001_i64);
        assert!(store.is_empty());

        let first = store.get_or_create(&user);
        first.lock().await.select(Variant::V3);

        let second = store.get_or_create(&user);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.lock().await.selected_variant(), 3);
        assert_eq!(store.len(), 1);
        assert!(store.contains(&user));
    }

    #[tokio::test]
    async fn concurrent_first_contact_creates_one_session() {
        let store = Arc::new(SessionStore::new());
        let user = UserId::from("racer");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                let user = user.clone();
                tokio::spawn(async move { store.get_or_create(&user) })
            })
            .collect();

        let mut sessions = Vec::new();
        for h in handles {
            sessions.push(h.await.unwrap());
        }

        assert_eq!(store.len(), 1);
        assert!(sessions.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn evict_idle_removes_only_unused_sessions() {
        let store = SessionStore::new();
        let idle = UserId::from("idle");
        let held = UserId::from("held");

        drop(store.get_or_create(&idle));
        let _held_handle = store.get_or_create(&held);

        assert_eq!(store.evict_idle(Duration::ZERO), 1);
        assert!(!store.contains(&idle));
        assert!(store.contains(&held));
    }

    #[test]
    fn evict_idle_keeps_recent_sessions() {
        let store = SessionStore::new();
        drop(store.get_or_create(&UserId::from("fresh")));
        assert_eq!(store.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(store.len(), 1);
    }
}
