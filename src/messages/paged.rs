//! Paged message - a list of pages flipped with ⬅️ and ➡️.

use crate::{
    errors::Result,
    interactive::{
        Actor, Button, ChannelId, Content, Embed, InteractiveMessage, InteractiveMessageHandler,
        MessageId, MessageOptions, MessageTransport, MessageView,
    },
};
use async_trait::async_trait;
use std::fmt::Display;
use std::sync::Arc;

/// Body shown when there is nothing to page through.
pub const EMPTY_PAGE: &str = "Nothing to show.";

const LEFT: &str = "left";
const RIGHT: &str = "right";

struct PagedView {
    title: String,
    pages: Vec<String>,
    index: usize,
    help: Option<String>,
}

impl PagedView {
    fn render(&self) -> Content {
        let mut embed = Embed::new()
            .title(&self.title)
            .description(&self.pages[self.index])
            .footer(format!("Page {}/{}", self.index + 1, self.pages.len()));
        if let Some(help) = &self.help {
            embed = embed.field("Buttons", help, false);
        }
        Content::embed(embed)
    }
}

/// One "emoji help" entry per enabled button that has help text.
fn help_line(buttons: &[Button]) -> Option<String> {
    let entries: Vec<String> = buttons
        .iter()
        .filter(|button| !button.disabled)
        .filter_map(|button| {
            button
                .help_message
                .as_ref()
                .map(|help| format!("{} {}", button.emoji, help))
        })
        .collect();
    (!entries.is_empty()).then(|| entries.join(" · "))
}

#[async_trait]
impl MessageView for PagedView {
    async fn button_press(
        &mut self,
        message: &InteractiveMessage,
        button: &str,
        _actor: &Actor,
    ) -> Result<()> {
        let count = self.pages.len();
        self.index = match button {
            LEFT => (self.index + count - 1) % count,
            RIGHT => (self.index + 1) % count,
            _ => return Ok(()),
        };
        message.set_content(self.render()).await;
        Ok(())
    }
}

/// An interactive message showing one page at a time.
///
/// Navigation wraps around at both ends. A single page disables both arrows.
#[derive(Debug, Clone)]
pub struct PagedMessage {
    message: InteractiveMessage,
}

impl PagedMessage {
    /// Builds a paged message over pre-rendered page bodies.
    ///
    /// Any buttons in `options` are registered after the arrows.
    pub fn new(
        channel: ChannelId,
        transport: Arc<dyn MessageTransport>,
        handler: &InteractiveMessageHandler,
        title: impl Into<String>,
        mut pages: Vec<String>,
        options: MessageOptions,
    ) -> Result<Self> {
        if pages.is_empty() {
            pages.push(EMPTY_PAGE.to_string());
        }
        let single = pages.len() == 1;

        let mut left = Button::new(LEFT, "⬅️").help("Previous page");
        let mut right = Button::new(RIGHT, "➡️").help("Next page");
        if single {
            left = left.disabled();
            right = right.disabled();
        }
        let mut buttons = vec![left, right];
        buttons.extend(options.buttons);

        let view = PagedView {
            title: title.into(),
            pages,
            index: 0,
            help: help_line(&buttons),
        };
        let options = MessageOptions {
            content: Some(view.render()),
            buttons,
            ..options
        };

        let message = InteractiveMessage::new(channel, transport, handler, options, view)?;
        Ok(Self { message })
    }

    /// Splits `items` into pages of `per_page` lines each.
    pub fn from_items<T: Display>(
        channel: ChannelId,
        transport: Arc<dyn MessageTransport>,
        handler: &InteractiveMessageHandler,
        title: impl Into<String>,
        items: &[T],
        per_page: usize,
        options: MessageOptions,
    ) -> Result<Self> {
        let pages = paginate(items, per_page);
        Self::new(channel, transport, handler, title, pages, options)
    }

    /// The underlying interactive message.
    #[must_use]
    pub const fn message(&self) -> &InteractiveMessage {
        &self.message
    }

    /// Posts the first page.
    pub async fn send(&self) -> Result<MessageId> {
        self.message.send().await
    }
}

/// Groups display lines into page bodies.
#[must_use]
pub fn paginate<T: Display>(items: &[T], per_page: usize) -> Vec<String> {
    items
        .chunks(per_page.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}
