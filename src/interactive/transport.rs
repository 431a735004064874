//! The seams between the interactive core and the chat platform.
//!
//! The core only ever talks to a `MessageTransport`; reaction and rate-limit
//! notifications come in as plain values. The serenity implementation lives in
//! `crate::bot::transport`, the recording mock in `crate::test_utils`.

use crate::interactive::content::Content;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Identifier of a channel-like send target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

/// Transport-assigned identifier of a posted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a transport call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The user behind a reaction or command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Platform user id
    pub id: u64,
    /// Display name, empty for partial records
    pub name: String,
    /// Bot accounts are never routed
    pub bot: bool,
    /// Only the id is known; not enough to act on
    pub partial: bool,
}

impl Actor {
    /// A fully-known human user.
    #[must_use]
    pub fn user(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            bot: false,
            partial: false,
        }
    }

    /// A user known only by id.
    #[must_use]
    pub const fn partial(id: u64) -> Self {
        Self {
            id,
            name: String::new(),
            bot: false,
            partial: true,
        }
    }
}

/// A reaction added to (or removed from) some message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    /// Message the reaction belongs to
    pub message_id: MessageId,
    /// Emoji as the platform renders it
    pub emoji: String,
    /// Who reacted
    pub actor: Actor,
}

/// HTTP verb of a rate-limited request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH (message edits)
    Patch,
    /// DELETE
    Delete,
}

/// A throttling notification from the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Verb of the limited request
    pub method: HttpMethod,
    /// Route of the limited request, e.g. `/channels/1/messages/2`
    pub path: String,
    /// How long the route is blocked
    pub timeout: Duration,
}

/// Send, edit and react primitives supplied by the platform.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Posts a new message. `Ok(None)` means the platform accepted the call but
    /// produced no message (e.g. missing permissions).
    async fn send(
        &self,
        channel: ChannelId,
        content: &Content,
    ) -> Result<Option<MessageId>, TransportError>;

    /// Replaces the content of a posted message.
    async fn edit(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &Content,
    ) -> Result<(), TransportError>;

    /// Attaches a reaction to a posted message.
    async fn react(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), TransportError>;
}
