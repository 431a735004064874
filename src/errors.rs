//! Unified error types for the interactive message core and the bot layer.

use thiserror::Error;

/// Every failure the crate can surface.
#[derive(Debug, Error)]
pub enum Error {
    /// A button with the same name or emoji is already registered on the message.
    #[error("Duplicate button `{name}` ({emoji})")]
    DuplicateButton {
        /// Name of the rejected button
        name: String,
        /// Emoji of the rejected button
        emoji: String,
    },

    /// No button with this name exists on the message.
    #[error("Unknown button name: {name}")]
    UnknownButtonName {
        /// The name that was looked up
        name: String,
    },

    /// No button is bound to this emoji.
    #[error("Unknown button emoji: {emoji}")]
    UnknownButton {
        /// The emoji that was looked up
        emoji: String,
    },

    /// The transport did not produce a message.
    #[error("Failed to send message: {reason}")]
    MessageSend {
        /// Transport-provided reason
        reason: String,
    },

    /// A button reaction could not be attached after the message was sent.
    #[error("Failed to attach reaction {emoji}: {reason}")]
    ReactionAttach {
        /// Emoji that failed
        emoji: String,
        /// Transport-provided reason
        reason: String,
    },

    /// Editing a live message failed.
    #[error("Failed to edit message: {reason}")]
    Edit {
        /// Transport-provided reason
        reason: String,
    },

    /// `send()` was called on a message that is already sending or sent.
    #[error("Message was already sent")]
    AlreadySent,

    /// The message has been deactivated and cannot be sent any more.
    #[error("Message is deactivated")]
    Deactivated,

    /// User input could not be stored in a document field.
    #[error("Invalid value for `{field}`: {message}")]
    InvalidFieldValue {
        /// Field key (or index) being edited
        field: String,
        /// Why the value was rejected
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description
        message: String,
    },

    /// A command failed in a way the user should be told about.
    #[error("Command execution error: {message}")]
    Command {
        /// Human readable description
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
