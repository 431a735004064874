//! Editable document - walk a nested document with reactions and overwrite scalar
//! fields by typing a reply.
//!
//! Buttons: ⬆️/⬇️ move the pointer, ✅ descends into a container or starts editing a
//! scalar, ↩️ goes back up (or cancels an edit), 🆗 submits. Typed replies reach the
//! document through [`EditableDocumentMessage::supply_input`].

use crate::{
    errors::{Error, Result},
    interactive::{
        Actor, Button, ChannelId, Content, Embed, InteractiveMessage, InteractiveMessageHandler,
        MessageId, MessageOptions, MessageTransport, MessageView, Phase,
    },
};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, oneshot};
use tracing::debug;

const UP: &str = "up";
const DOWN: &str = "down";
const SELECT: &str = "select";
const BACK: &str = "back";
const SUBMIT: &str = "submit";

/// A value stored in a document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Free text
    String(String),
    /// Any finite number
    Number(f64),
    /// Ordered list of values
    Array(Vec<FieldValue>),
    /// Nested document
    Document(Document),
}

impl FieldValue {
    fn preview(&self) -> String {
        match self {
            Self::String(text) if text.is_empty() => "*(empty)*".to_string(),
            Self::String(text) => format!("\"{text}\""),
            Self::Number(number) => number.to_string(),
            Self::Array(items) => format!("[{} items]", items.len()),
            Self::Document(document) => format!("{{{} fields}}", document.len()),
        }
    }
}

/// Ordered key/value document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<(String, FieldValue)>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.entries.push((key.into(), value));
        self
    }

    /// Value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(entry_key, _)| entry_key == key)
            .map(|(_, value)| value)
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[(String, FieldValue)] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

enum Level<'a> {
    Document(&'a Document),
    Array(&'a [FieldValue]),
}

enum LevelMut<'a> {
    Document(&'a mut Document),
    Array(&'a mut Vec<FieldValue>),
}

impl<'a> Level<'a> {
    fn of(value: &'a FieldValue) -> Option<Self> {
        match value {
            FieldValue::Document(document) => Some(Self::Document(document)),
            FieldValue::Array(items) => Some(Self::Array(items)),
            FieldValue::String(_) | FieldValue::Number(_) => None,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Document(document) => document.len(),
            Self::Array(items) => items.len(),
        }
    }

    fn get(&self, index: usize) -> Option<(String, &'a FieldValue)> {
        match self {
            Self::Document(document) => document
                .entries
                .get(index)
                .map(|(key, value)| (key.clone(), value)),
            Self::Array(items) => items.get(index).map(|value| (format!("#{index}"), value)),
        }
    }
}

impl<'a> LevelMut<'a> {
    fn of(value: &'a mut FieldValue) -> Option<Self> {
        match value {
            FieldValue::Document(document) => Some(Self::Document(document)),
            FieldValue::Array(items) => Some(Self::Array(items)),
            FieldValue::String(_) | FieldValue::Number(_) => None,
        }
    }

    fn into_value(self, index: usize) -> Option<&'a mut FieldValue> {
        match self {
            Self::Document(document) => document.entries.get_mut(index).map(|(_, value)| value),
            Self::Array(items) => items.get_mut(index),
        }
    }
}

struct DocumentState {
    title: String,
    document: Document,
    path: Vec<usize>,
    pointer: usize,
    editing: bool,
    submit: Option<oneshot::Sender<Document>>,
}

impl DocumentState {
    fn level(&self) -> Level<'_> {
        let mut level = Level::Document(&self.document);
        for &index in &self.path {
            match level.get(index).and_then(|(_, value)| Level::of(value)) {
                Some(next) => level = next,
                None => break,
            }
        }
        level
    }

    fn selected_mut(&mut self) -> Option<&mut FieldValue> {
        let mut level = LevelMut::Document(&mut self.document);
        for &index in &self.path {
            level = LevelMut::of(level.into_value(index)?)?;
        }
        level.into_value(self.pointer)
    }

    fn selected_label(&self) -> String {
        self.level()
            .get(self.pointer)
            .map_or_else(String::new, |(label, _)| label)
    }

    fn breadcrumb(&self) -> String {
        let mut crumbs = vec![self.title.clone()];
        let mut level = Level::Document(&self.document);
        for &index in &self.path {
            let Some((label, value)) = level.get(index) else {
                break;
            };
            crumbs.push(label);
            match Level::of(value) {
                Some(next) => level = next,
                None => break,
            }
        }
        crumbs.join(" › ")
    }

    fn move_pointer(&mut self, up: bool) {
        if self.editing {
            return;
        }
        let last = self.level().len().saturating_sub(1);
        self.pointer = if up {
            self.pointer.saturating_sub(1)
        } else {
            (self.pointer + 1).min(last)
        };
    }

    fn select(&mut self) {
        if self.editing {
            return;
        }
        let Some((_, value)) = self.level().get(self.pointer) else {
            return;
        };
        let descend = match value {
            FieldValue::Array(_) | FieldValue::Document(_) => true,
            FieldValue::String(_) | FieldValue::Number(_) => false,
        };
        if descend {
            self.path.push(self.pointer);
            self.pointer = 0;
        } else {
            self.editing = true;
        }
    }

    fn back(&mut self) {
        if self.editing {
            self.editing = false;
        } else if let Some(parent) = self.path.pop() {
            self.pointer = parent;
        }
    }

    fn apply_input(&mut self, text: &str) -> Result<()> {
        let field = self.selected_label();
        let Some(target) = self.selected_mut() else {
            return Err(Error::InvalidFieldValue {
                field,
                message: "field no longer exists".to_string(),
            });
        };
        match target {
            FieldValue::String(current) => *current = text.trim().to_string(),
            FieldValue::Number(current) => {
                let parsed: f64 = text.trim().parse().map_err(|_| Error::InvalidFieldValue {
                    field: field.clone(),
                    message: format!("`{}` is not a number", text.trim()),
                })?;
                if !parsed.is_finite() {
                    return Err(Error::InvalidFieldValue {
                        field,
                        message: "must be a finite number".to_string(),
                    });
                }
                *current = parsed;
            }
            FieldValue::Array(_) | FieldValue::Document(_) => {
                return Err(Error::InvalidFieldValue {
                    field,
                    message: "containers cannot be overwritten with text".to_string(),
                });
            }
        }
        self.editing = false;
        Ok(())
    }

    fn render(&self) -> Content {
        let level = self.level();
        let mut lines = Vec::with_capacity(level.len());
        for index in 0..level.len() {
            if let Some((label, value)) = level.get(index) {
                let marker = if index == self.pointer { "▶" } else { "▫️" };
                lines.push(format!("{marker} **{label}**: {}", value.preview()));
            }
        }
        if lines.is_empty() {
            lines.push("*(empty)*".to_string());
        }

        let footer = if self.editing {
            format!("Type a new value for {}", self.selected_label())
        } else {
            "⬆️⬇️ move · ✅ select · ↩️ back · 🆗 submit".to_string()
        };
        Content::embed(
            Embed::new()
                .title(self.breadcrumb())
                .description(lines.join("\n"))
                .footer(footer),
        )
    }
}

struct DocumentView {
    state: Arc<Mutex<DocumentState>>,
}

#[async_trait]
impl MessageView for DocumentView {
    async fn button_press(
        &mut self,
        message: &InteractiveMessage,
        button: &str,
        _actor: &Actor,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        match button {
            UP => state.move_pointer(true),
            DOWN => state.move_pointer(false),
            SELECT => state.select(),
            BACK => state.back(),
            SUBMIT => {
                if let Some(submit) = state.submit.take() {
                    // The receiver may have been dropped; the document is still final.
                    let _ = submit.send(state.document.clone());
                }
                drop(state);
                message.deactivate().await;
                return Ok(());
            }
            other => {
                debug!("Document editor ignoring button {}", other);
                return Ok(());
            }
        }
        let rendered = state.render();
        drop(state);
        message.set_content(rendered).await;
        Ok(())
    }
}

/// Interactive editor over a [`Document`].
#[derive(Clone)]
pub struct EditableDocumentMessage {
    message: InteractiveMessage,
    state: Arc<Mutex<DocumentState>>,
}

impl fmt::Debug for EditableDocumentMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditableDocumentMessage")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl EditableDocumentMessage {
    /// Builds the editor. The receiver resolves with the final document on submit and
    /// errors once the message deactivates without one.
    ///
    /// Any buttons in `options` are registered after the editor's own; the editor
    /// ignores their presses.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        channel: ChannelId,
        transport: Arc<dyn MessageTransport>,
        handler: &InteractiveMessageHandler,
        title: impl Into<String>,
        document: Document,
        options: MessageOptions,
    ) -> Result<(Self, oneshot::Receiver<Document>)> {
        let (submit, submitted) = oneshot::channel();
        let state = DocumentState {
            title: title.into(),
            document,
            path: Vec::new(),
            pointer: 0,
            editing: false,
            submit: Some(submit),
        };
        let extra = options.buttons;
        let options = MessageOptions {
            content: Some(state.render()),
            buttons: Vec::new(),
            ..options
        }
        .buttons([
            Button::new(UP, "⬆️").help("Move up"),
            Button::new(DOWN, "⬇️").help("Move down"),
            Button::new(SELECT, "✅").help("Open or edit the selected field"),
            Button::new(BACK, "↩️").help("Go back"),
            Button::new(SUBMIT, "🆗").help("Save and close"),
        ])
        .buttons(extra);

        let state = Arc::new(Mutex::new(state));
        let view = DocumentView {
            state: Arc::clone(&state),
        };
        let message = InteractiveMessage::new(channel, transport, handler, options, view)?;

        // Close the submit channel once the editor is gone without a submit.
        let mut phases = message.subscribe();
        let pending = Arc::clone(&state);
        tokio::spawn(async move {
            let _ = phases
                .wait_for(|phase| matches!(phase, Phase::Deactivated(_)))
                .await;
            pending.lock().await.submit.take();
        });

        Ok((Self { message, state }, submitted))
    }

    /// The underlying interactive message.
    #[must_use]
    pub const fn message(&self) -> &InteractiveMessage {
        &self.message
    }

    /// Posts the editor.
    pub async fn send(&self) -> Result<MessageId> {
        self.message.send().await
    }

    /// Feeds a typed reply into the field being edited.
    ///
    /// Returns `Ok(false)` when no field is being edited (the reply is not for us).
    /// A reply that does not fit the field fails with `InvalidFieldValue` and leaves
    /// the editor waiting for another try.
    pub async fn supply_input(&self, actor: &Actor, text: &str) -> Result<bool> {
        if actor.bot || self.message.is_deactivated() {
            return Ok(false);
        }
        let rendered = {
            let mut state = self.state.lock().await;
            if !state.editing {
                return Ok(false);
            }
            state.apply_input(text)?;
            state.render()
        };
        self.message.reset_timer();
        self.message.set_content(rendered).await;
        Ok(true)
    }

    /// Snapshot of the document as edited so far.
    pub async fn document(&self) -> Document {
        self.state.lock().await.document.clone()
    }

    /// Whether a scalar field is waiting for input.
    pub async fn is_editing(&self) -> bool {
        self.state.lock().await.editing
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::interactive::{Dispatch, ReactionEvent};
    use crate::test_utils::{MockTransport, TEST_CHANNEL, setup, user};

    fn animal() -> Document {
        Document::new()
            .with("nickname", FieldValue::String("Biscuit".into()))
            .with("level", FieldValue::Number(3.0))
            .with(
                "tags",
                FieldValue::Array(vec![
                    FieldValue::String("fluffy".into()),
                    FieldValue::String("loud".into()),
                ]),
            )
            .with(
                "stats",
                FieldValue::Document(Document::new().with("speed", FieldValue::Number(12.5))),
            )
    }

    async fn editor(
        transport: &Arc<MockTransport>,
        handler: &InteractiveMessageHandler,
    ) -> (EditableDocumentMessage, MessageId, oneshot::Receiver<Document>) {
        let shared: Arc<dyn MessageTransport> = transport.clone();
        let (editor, submitted) = EditableDocumentMessage::new(
            TEST_CHANNEL,
            shared,
            handler,
            "Biscuit",
            animal(),
            MessageOptions::default(),
        )
        .unwrap();
        let id = editor.send().await.unwrap();
        (editor, id, submitted)
    }

    async fn press(handler: &InteractiveMessageHandler, id: MessageId, emoji: &str) -> Dispatch {
        handler
            .handle_reaction(&ReactionEvent {
                message_id: id,
                emoji: emoji.to_string(),
                actor: user(),
            })
            .await
    }

    fn description(editor: &EditableDocumentMessage) -> String {
        editor
            .message()
            .content()
            .unwrap()
            .embed
            .unwrap()
            .description
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_render_marks_first_field() {
        let (transport, handler) = setup();
        let (editor, _, _) = editor(&transport, &handler).await;

        let text = description(&editor);
        assert!(text.starts_with("▶ **nickname**: \"Biscuit\""));
        assert!(text.contains("**tags**: [2 items]"));
        assert!(text.contains("**stats**: {1 fields}"));
        assert_eq!(transport.reactions(), vec!["⬆️", "⬇️", "✅", "↩️", "🆗"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_number_field() {
        let (transport, handler) = setup();
        let (editor, id, _) = editor(&transport, &handler).await;

        press(&handler, id, "⬇️").await;
        press(&handler, id, "✅").await;
        assert!(editor.is_editing().await);

        let bad = editor.supply_input(&user(), "lots").await;
        assert!(matches!(bad, Err(Error::InvalidFieldValue { .. })));
        assert!(editor.is_editing().await);

        assert!(editor.supply_input(&user(), " 4 ").await.unwrap());
        assert!(!editor.is_editing().await);
        assert_eq!(
            editor.document().await.get("level"),
            Some(&FieldValue::Number(4.0))
        );
        assert!(description(&editor).contains("▶ **level**: 4"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_non_finite_numbers() {
        let (transport, handler) = setup();
        let (editor, id, _) = editor(&transport, &handler).await;
        press(&handler, id, "⬇️").await;
        press(&handler, id, "✅").await;

        assert!(matches!(
            editor.supply_input(&user(), "NaN").await,
            Err(Error::InvalidFieldValue { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_descend_into_nested_document_and_back() {
        let (transport, handler) = setup();
        let (editor, id, _) = editor(&transport, &handler).await;

        for _ in 0..5 {
            press(&handler, id, "⬇️").await;
        }
        press(&handler, id, "✅").await;
        let title = editor.message().content().unwrap().embed.unwrap().title;
        assert_eq!(title.as_deref(), Some("Biscuit › stats"));

        press(&handler, id, "✅").await;
        editor.supply_input(&user(), "15").await.unwrap();
        let stats = editor.document().await;
        assert_eq!(
            stats.get("stats"),
            Some(&FieldValue::Document(
                Document::new().with("speed", FieldValue::Number(15.0))
            ))
        );

        press(&handler, id, "↩️").await;
        assert!(description(&editor).contains("▶ **stats**"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_array_element() {
        let (transport, handler) = setup();
        let (editor, id, _) = editor(&transport, &handler).await;

        press(&handler, id, "⬇️").await;
        press(&handler, id, "⬇️").await;
        press(&handler, id, "✅").await;
        press(&handler, id, "⬇️").await;
        press(&handler, id, "✅").await;
        editor.supply_input(&user(), "quiet").await.unwrap();

        assert_eq!(
            editor.document().await.get("tags"),
            Some(&FieldValue::Array(vec![
                FieldValue::String("fluffy".into()),
                FieldValue::String("quiet".into()),
            ]))
        );
        assert!(description(&editor).contains("▶ **#1**: \"quiet\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_cancels_edit() {
        let (transport, handler) = setup();
        let (editor, id, _) = editor(&transport, &handler).await;

        press(&handler, id, "✅").await;
        press(&handler, id, "↩️").await;

        assert!(!editor.is_editing().await);
        assert!(!editor.supply_input(&user(), "ignored").await.unwrap());
        assert_eq!(editor.document().await, animal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_resolves_and_deactivates() {
        let (transport, handler) = setup();
        let (editor, id, submitted) = editor(&transport, &handler).await;

        press(&handler, id, "✅").await;
        editor.supply_input(&user(), "Sir Biscuit").await.unwrap();
        press(&handler, id, "🆗").await;

        let document = submitted.await.unwrap();
        assert_eq!(
            document.get("nickname"),
            Some(&FieldValue::String("Sir Biscuit".into()))
        );
        assert!(editor.message().is_deactivated());
        assert!(!handler.contains(id).await);
        assert!(
            transport
                .edits()
                .last()
                .unwrap()
                .trailer()
                .unwrap()
                .ends_with("(message deactivated)")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivation_without_submit_closes_channel() {
        let (transport, handler) = setup();
        let (editor, _, submitted) = editor(&transport, &handler).await;

        editor.message().deactivate().await;

        assert!(submitted.await.is_err());
        assert_eq!(editor.document().await, animal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_extra_buttons_follow_editor_buttons() {
        let (transport, handler) = setup();
        let shared: Arc<dyn MessageTransport> = transport.clone();
        let (editor, _) = EditableDocumentMessage::new(
            TEST_CHANNEL,
            shared,
            &handler,
            "Biscuit",
            animal(),
            MessageOptions::default().button(Button::new("release", "🕊️")),
        )
        .unwrap();
        let id = editor.send().await.unwrap();

        assert_eq!(
            transport.reactions(),
            vec!["⬆️", "⬇️", "✅", "↩️", "🆗", "🕊️"]
        );
        assert_eq!(press(&handler, id, "🕊️").await, Dispatch::Pressed);
        assert_eq!(editor.document().await, animal());
    }
}
