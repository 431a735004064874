//! Registry of live interactive messages and router for platform events.
//!
//! One handler is constructed per application and passed to everything that creates
//! prompts. It maps transport message ids to their `InteractiveMessage`, filters raw
//! reaction events down to legitimate button presses, and forwards edit rate limits to
//! the message they concern.

use crate::interactive::{
    message::InteractiveMessage,
    transport::{HttpMethod, MessageId, RateLimitInfo, ReactionEvent},
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

/// Why a reaction was not routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// Reacting account is a bot
    BotActor,
    /// Only a partial user record is available
    PartialActor,
    /// No live message has this id
    UnknownMessage,
    /// Emoji is not an enabled button
    InactiveButton,
    /// Message edits are currently throttled
    RateLimited,
}

/// Result of routing one reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The button ran to completion
    Pressed,
    /// The button ran and returned an error, which was logged
    Failed,
    /// The reaction was filtered out
    Ignored(Ignored),
}

/// Process-wide index of live interactive messages.
#[derive(Clone, Default)]
pub struct InteractiveMessageHandler {
    messages: Arc<RwLock<HashMap<MessageId, InteractiveMessage>>>,
}

impl std::fmt::Debug for InteractiveMessageHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractiveMessageHandler")
            .finish_non_exhaustive()
    }
}

impl InteractiveMessageHandler {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes a sent message under its id. Messages without an id, and messages
    /// that are already deactivated, are ignored.
    pub async fn add_message(&self, message: InteractiveMessage) {
        let Some(id) = message.id() else {
            debug!("Not registering an unsent message");
            return;
        };
        let mut messages = self.messages.write().await;
        // `deactivate` publishes its phase before taking this lock, so checking under
        // the lock cannot miss a deactivation that raced the send.
        if message.is_deactivated() {
            debug!("Not registering deactivated message {}", id);
            return;
        }
        messages.insert(id, message);
    }

    /// Drops the entry for `id`. Absent ids are fine.
    pub async fn remove_message(&self, id: MessageId) {
        self.messages.write().await.remove(&id);
    }

    /// The live message with this id, if any.
    pub async fn get(&self, id: MessageId) -> Option<InteractiveMessage> {
        self.messages.read().await.get(&id).cloned()
    }

    /// Whether a live message has this id.
    pub async fn contains(&self, id: MessageId) -> bool {
        self.messages.read().await.contains_key(&id)
    }

    /// Number of live messages.
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Whether no messages are live.
    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// Routes a reaction to the message it was added to.
    ///
    /// Checks, in order: bot actor, partial actor, registered message, enabled button,
    /// rate limit. The first failing check ends routing quietly. Errors from the
    /// button logic are logged and never propagate.
    pub async fn handle_reaction(&self, event: &ReactionEvent) -> Dispatch {
        let ignored = |reason: Ignored| {
            debug!(
                "Ignoring reaction {} on {}: {:?}",
                event.emoji, event.message_id, reason
            );
            Dispatch::Ignored(reason)
        };

        if event.actor.bot {
            return ignored(Ignored::BotActor);
        }
        if event.actor.partial {
            return ignored(Ignored::PartialActor);
        }
        let Some(message) = self.get(event.message_id).await else {
            return ignored(Ignored::UnknownMessage);
        };
        if message.is_deactivated() {
            return ignored(Ignored::UnknownMessage);
        }
        if !message.is_button_active(&event.emoji) {
            return ignored(Ignored::InactiveButton);
        }
        if message.is_rate_limited() {
            return ignored(Ignored::RateLimited);
        }

        match message.emoji_press(&event.emoji, &event.actor).await {
            Ok(()) => Dispatch::Pressed,
            Err(e) => {
                error!(
                    "Button {} on message {} failed: {}",
                    event.emoji, event.message_id, e
                );
                Dispatch::Failed
            }
        }
    }

    /// Removing a reaction counts as pressing the button again.
    pub async fn handle_reaction_removed(&self, event: &ReactionEvent) -> Dispatch {
        self.handle_reaction(event).await
    }

    /// Forwards a message-edit rate limit to the affected live message.
    ///
    /// Returns the id of the message that was throttled, if any.
    pub async fn handle_rate_limit(&self, info: &RateLimitInfo) -> Option<MessageId> {
        if info.method != HttpMethod::Patch {
            return None;
        }
        let id = extract_message_id(&info.path)?;
        let message = self.get(id).await?;
        message.apply_rate_limit(info.timeout);
        debug!("Applied {:?} rate limit to message {}", info.timeout, id);
        Some(id)
    }
}

/// Pulls the message id out of a route ending in `channels/{channel}/messages/{message}`.
///
/// Anything before the `channels` segment (an API base URL) is ignored.
#[must_use]
pub fn extract_message_id(path: &str) -> Option<MessageId> {
    let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
    match segments.as_slice() {
        [.., "channels", _, "messages", id] => id.parse().ok().map(MessageId),
        _ => None,
    }
}
