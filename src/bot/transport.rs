//! Serenity implementation of the message transport.

use crate::interactive::{ChannelId, Content, Embed, MessageId, MessageTransport, TransportError};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Sends, edits and reacts through the Discord HTTP API.
#[derive(Clone)]
pub struct SerenityTransport {
    http: Arc<serenity::Http>,
}

impl SerenityTransport {
    /// Wraps the client's HTTP handle.
    #[must_use]
    pub const fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

fn channel_id(channel: ChannelId) -> Result<serenity::ChannelId, TransportError> {
    if channel.0 == 0 {
        return Err(TransportError("channel id 0 is not valid".to_string()));
    }
    Ok(serenity::ChannelId::new(channel.0))
}

fn message_id(message: MessageId) -> Result<serenity::MessageId, TransportError> {
    if message.0 == 0 {
        return Err(TransportError("message id 0 is not valid".to_string()));
    }
    Ok(serenity::MessageId::new(message.0))
}

#[allow(clippy::needless_pass_by_value)] // used as a `map_err` adapter
fn transport_error(error: serenity::Error) -> TransportError {
    TransportError(error.to_string())
}

/// Converts an embed into serenity's builder.
#[must_use]
pub fn create_embed(embed: &Embed) -> serenity::CreateEmbed {
    let mut builder = serenity::CreateEmbed::new();
    if let Some(title) = &embed.title {
        builder = builder.title(title);
    }
    if let Some(description) = &embed.description {
        builder = builder.description(description);
    }
    for field in &embed.fields {
        builder = builder.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &embed.footer {
        builder = builder.footer(serenity::CreateEmbedFooter::new(footer));
    }
    if let Some(colour) = embed.colour {
        builder = builder.colour(colour);
    }
    builder
}

fn create_message(content: &Content) -> serenity::CreateMessage {
    let mut builder = serenity::CreateMessage::new();
    if let Some(text) = &content.text {
        builder = builder.content(text);
    }
    if let Some(embed) = &content.embed {
        builder = builder.embed(create_embed(embed));
    }
    builder
}

fn edit_message(content: &Content) -> serenity::EditMessage {
    // Edits replace the whole message, so absent parts are cleared explicitly.
    let builder =
        serenity::EditMessage::new().content(content.text.clone().unwrap_or_default());
    match &content.embed {
        Some(embed) => builder.embed(create_embed(embed)),
        None => builder.embeds(Vec::new()),
    }
}

#[async_trait]
impl MessageTransport for SerenityTransport {
    async fn send(
        &self,
        channel: ChannelId,
        content: &Content,
    ) -> Result<Option<MessageId>, TransportError> {
        let sent = channel_id(channel)?
            .send_message(self.http.as_ref(), create_message(content))
            .await
            .map_err(transport_error)?;
        Ok(Some(MessageId(sent.id.get())))
    }

    async fn edit(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &Content,
    ) -> Result<(), TransportError> {
        channel_id(channel)?
            .edit_message(self.http.as_ref(), message_id(message)?, edit_message(content))
            .await
            .map(|_| ())
            .map_err(transport_error)
    }

    async fn react(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), TransportError> {
        channel_id(channel)?
            .create_reaction(
                &self.http,
                message_id(message)?,
                serenity::ReactionType::Unicode(emoji.to_string()),
            )
            .await
            .map_err(transport_error)
    }
}
