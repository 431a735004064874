//! Reaction-driven interactive messages.
//!
//! An [`InteractiveMessage`] is posted once, decorated with one reaction per
//! [`Button`], and re-rendered in place as users press them. The
//! [`InteractiveMessageHandler`] owns the index of live messages and routes platform
//! reaction and rate-limit events to them.

/// Emoji-keyed buttons
pub mod button;
/// Renderable payload
pub mod content;
/// Live-message registry and event router
pub mod handler;
/// The interactive message state machine
pub mod message;
/// Resettable countdown
pub mod timer;
/// Platform seams
pub mod transport;

pub use button::{Button, ButtonSet};
pub use content::{Content, Embed, EmbedField};
pub use handler::{Dispatch, Ignored, InteractiveMessageHandler};
pub use message::{InteractiveMessage, MessageOptions, MessageView, Phase};
pub use transport::{
    Actor, ChannelId, HttpMethod, MessageId, MessageTransport, RateLimitInfo, ReactionEvent,
    TransportError,
};
