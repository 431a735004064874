//! Shared test utilities.
//!
//! This module provides a recording transport, ready-made actors and helpers for
//! driving tokio's paused clock.

#![allow(clippy::unwrap_used)]

use crate::interactive::{
    content::Content,
    handler::InteractiveMessageHandler,
    transport::{Actor, ChannelId, MessageId, MessageTransport, TransportError},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

/// Channel every test message is sent to.
pub const TEST_CHANNEL: ChannelId = ChannelId(42);

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// `send` was called
    Send {
        /// Target channel
        channel: ChannelId,
        /// Posted content
        content: Content,
    },
    /// `edit` was called
    Edit {
        /// Edited message
        message: MessageId,
        /// New content
        content: Content,
    },
    /// `react` was called
    React {
        /// Message reacted to
        message: MessageId,
        /// Attached emoji
        emoji: String,
    },
}

/// Transport that records every call in order and can be told to fail.
///
/// Message ids are handed out sequentially starting at 1000.
#[derive(Debug, Default)]
pub struct MockTransport {
    calls: Mutex<Vec<TransportCall>>,
    next_id: AtomicU64,
    send_error: AtomicBool,
    send_returns_nothing: AtomicBool,
    edit_error: AtomicBool,
    failing_reaction: Mutex<Option<String>>,
    send_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockTransport {
    /// Creates a transport that succeeds at everything.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1000),
            ..Self::default()
        })
    }

    /// Snapshot of every call so far.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Contents of every `edit` call, in order.
    pub fn edits(&self) -> Vec<Content> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Edit { content, .. } => Some(content),
                _ => None,
            })
            .collect()
    }

    /// Emojis of every `react` call, in order.
    pub fn reactions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::React { emoji, .. } => Some(emoji),
                _ => None,
            })
            .collect()
    }

    /// Number of `send` calls.
    pub fn send_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, TransportCall::Send { .. }))
            .count()
    }

    /// Forgets recorded calls.
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Makes `send` return a transport error.
    pub fn fail_sends(&self) {
        self.send_error.store(true, Ordering::SeqCst);
    }

    /// Makes `send` succeed without producing a message.
    pub fn send_nothing(&self) {
        self.send_returns_nothing.store(true, Ordering::SeqCst);
    }

    /// Makes `edit` fail.
    pub fn fail_edits(&self) {
        self.edit_error.store(true, Ordering::SeqCst);
    }

    /// Holds every `send` (after recording it) until the returned gate is notified.
    pub fn hold_sends(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.send_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Makes `react` fail for one emoji.
    pub fn fail_reaction(&self, emoji: &str) {
        *self.failing_reaction.lock().unwrap() = Some(emoji.to_string());
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn send(
        &self,
        channel: ChannelId,
        content: &Content,
    ) -> Result<Option<MessageId>, TransportError> {
        self.record(TransportCall::Send {
            channel,
            content: content.clone(),
        });
        let gate = self.send_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.send_error.load(Ordering::SeqCst) {
            return Err(TransportError("Missing Permissions".to_string()));
        }
        if self.send_returns_nothing.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))))
    }

    async fn edit(
        &self,
        _channel: ChannelId,
        message: MessageId,
        content: &Content,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Edit {
            message,
            content: content.clone(),
        });
        if self.edit_error.load(Ordering::SeqCst) {
            return Err(TransportError("Unknown Message".to_string()));
        }
        Ok(())
    }

    async fn react(
        &self,
        _channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::React {
            message,
            emoji: emoji.to_string(),
        });
        if self.failing_reaction.lock().unwrap().as_deref() == Some(emoji) {
            return Err(TransportError("Reaction blocked".to_string()));
        }
        Ok(())
    }
}

/// A regular user.
pub fn user() -> Actor {
    Actor::user(7, "keeper")
}

/// A bot account.
pub fn bot_user() -> Actor {
    Actor {
        bot: true,
        ..Actor::user(8, "some-bot")
    }
}

/// A user known only by id.
pub fn partial_user() -> Actor {
    Actor::partial(9)
}

/// Fresh transport and handler.
pub fn setup() -> (Arc<MockTransport>, InteractiveMessageHandler) {
    init_test_tracing();
    (MockTransport::new(), InteractiveMessageHandler::new())
}

/// Installs a test-writer subscriber once per process.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Lets spawned tasks (timer callbacks) run to completion on the test runtime.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Button presses seen by a [`RecordingView`]: `(button name, actor id)`.
#[derive(Debug, Clone, Default)]
pub struct Presses(Arc<Mutex<Vec<(String, u64)>>>);

impl Presses {
    /// Snapshot of the presses so far.
    pub fn get(&self) -> Vec<(String, u64)> {
        self.0.lock().unwrap().clone()
    }
}

/// View that records presses, re-renders with the button name, and can be told to
/// fail on one button.
#[derive(Debug, Default)]
pub struct RecordingView {
    /// Shared press log
    pub presses: Presses,
    /// Button whose press returns an error
    pub fail_on: Option<&'static str>,
}

#[async_trait]
impl crate::interactive::message::MessageView for RecordingView {
    async fn button_press(
        &mut self,
        message: &crate::interactive::message::InteractiveMessage,
        button: &str,
        actor: &Actor,
    ) -> crate::errors::Result<()> {
        self.presses.0.lock().unwrap().push((button.to_string(), actor.id));
        if self.fail_on == Some(button) {
            return Err(crate::errors::Error::Command {
                message: format!("{button} exploded"),
            });
        }
        message
            .set_content(Content::text(format!("pressed {button}")))
            .await;
        Ok(())
    }
}
