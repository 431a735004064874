//! A single live, reaction-driven prompt.
//!
//! `InteractiveMessage` owns the transport-facing lifecycle (send, edit, react, timers,
//! deactivation). What buttons *mean* is left to a [`MessageView`], which receives the
//! message handle on every press and re-renders through [`InteractiveMessage::set_content`].
//!
//! Locking: `state` is a `std::sync::Mutex` that is never held across an `.await`;
//! transport calls always happen after it is released. The view sits behind a
//! `tokio::sync::Mutex`, so presses on the same message run one at a time.

use crate::{
    config::InteractiveSettings,
    errors::{Error, Result},
    interactive::{
        button::{Button, ButtonSet},
        content::Content,
        handler::InteractiveMessageHandler,
        timer::LifetimeTimer,
        transport::{Actor, ChannelId, MessageId, MessageTransport},
    },
};
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{Notify, watch};
use tracing::{debug, info, instrument, warn};

/// Lifetime used when none is configured.
pub const DEFAULT_LIFETIME: Duration = Duration::from_millis(60_000);

/// Footer annotation used when none is configured.
pub const DEFAULT_DEACTIVATION_TEXT: &str = "(message deactivated)";

/// Construction options for an interactive message.
#[derive(Debug, Clone)]
pub struct MessageOptions {
    /// Initial content; `None` if the view builds it (possibly asynchronously)
    pub content: Option<Content>,
    /// Initial buttons, in reaction order
    pub buttons: Vec<Button>,
    /// Idle time before the message deactivates itself
    pub lifetime: Duration,
    /// Whether a press restarts the lifetime countdown
    pub reset_timer_on_button_press: bool,
    /// Appended to the trailer on deactivation
    pub deactivation_text: String,
}

impl Default for MessageOptions {
    fn default() -> Self {
        Self {
            content: None,
            buttons: Vec::new(),
            lifetime: DEFAULT_LIFETIME,
            reset_timer_on_button_press: true,
            deactivation_text: DEFAULT_DEACTIVATION_TEXT.to_string(),
        }
    }
}

impl MessageOptions {
    /// Options seeded from the `[interactive]` section of config.toml.
    #[must_use]
    pub fn from_settings(settings: &InteractiveSettings) -> Self {
        Self {
            lifetime: settings.lifetime(),
            reset_timer_on_button_press: settings.reset_timer_on_button_press,
            deactivation_text: settings.deactivation_text.clone(),
            ..Self::default()
        }
    }

    /// Sets the initial content.
    #[must_use]
    pub fn content(mut self, content: impl Into<Content>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Adds one button.
    #[must_use]
    pub fn button(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }

    /// Adds several buttons.
    #[must_use]
    pub fn buttons(mut self, buttons: impl IntoIterator<Item = Button>) -> Self {
        self.buttons.extend(buttons);
        self
    }

    /// Sets the lifetime.
    #[must_use]
    pub const fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Sets whether presses restart the countdown.
    #[must_use]
    pub const fn reset_timer_on_button_press(mut self, reset: bool) -> Self {
        self.reset_timer_on_button_press = reset;
        self
    }

    /// Sets the deactivation annotation.
    #[must_use]
    pub fn deactivation_text(mut self, text: impl Into<String>) -> Self {
        self.deactivation_text = text.into();
        self
    }
}

/// Lifecycle of an interactive message. `Deactivated` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, not yet transmitted
    Unsent,
    /// `send()` is in flight
    Sending,
    /// Posted, registered and routable
    Active(MessageId),
    /// Inert; carries the id if the message was ever posted
    Deactivated(Option<MessageId>),
}

/// Domain behaviour behind an interactive message.
#[async_trait]
pub trait MessageView: Send + 'static {
    /// Produces the initial content. Called by `send()` when no content was supplied
    /// up front; implementations call `message.set_content`.
    async fn build(&mut self, message: &InteractiveMessage) -> Result<()> {
        let _ = message;
        Ok(())
    }

    /// Reacts to a press of the named button. The timer has already been reset.
    async fn button_press(
        &mut self,
        message: &InteractiveMessage,
        button: &str,
        actor: &Actor,
    ) -> Result<()>;
}

/// View for messages whose buttons carry no behaviour of their own.
struct StaticView;

#[async_trait]
impl MessageView for StaticView {
    async fn button_press(
        &mut self,
        _message: &InteractiveMessage,
        _button: &str,
        _actor: &Actor,
    ) -> Result<()> {
        Ok(())
    }
}

enum SendOutcome {
    DeactivatedInFlight(Option<Content>),
    Live {
        emojis: Vec<String>,
        catch_up: Option<Content>,
    },
}

struct MessageState {
    phase: Phase,
    content: Option<Content>,
    buttons: ButtonSet,
    rate_limited: bool,
    expired: bool,
    lifetime_timer: LifetimeTimer,
    rate_limit_timer: LifetimeTimer,
}

struct Inner {
    channel: ChannelId,
    transport: Arc<dyn MessageTransport>,
    handler: InteractiveMessageHandler,
    lifetime: Duration,
    reset_timer_on_button_press: bool,
    deactivation_text: String,
    state: Mutex<MessageState>,
    view: tokio::sync::Mutex<Box<dyn MessageView>>,
    ready: Notify,
    phase_tx: watch::Sender<Phase>,
}

/// Cheaply clonable handle to one interactive prompt.
#[derive(Clone)]
pub struct InteractiveMessage {
    inner: Arc<Inner>,
}

impl fmt::Debug for InteractiveMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractiveMessage")
            .field("channel", &self.inner.channel)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl InteractiveMessage {
    /// Creates an unsent message driven by `view`.
    ///
    /// Fails with `DuplicateButton` if `options.buttons` repeats a name or emoji.
    pub fn new(
        channel: ChannelId,
        transport: Arc<dyn MessageTransport>,
        handler: &InteractiveMessageHandler,
        options: MessageOptions,
        view: impl MessageView,
    ) -> Result<Self> {
        let mut buttons = ButtonSet::new();
        for button in options.buttons {
            buttons.add(button)?;
        }
        let (phase_tx, _) = watch::channel(Phase::Unsent);

        Ok(Self {
            inner: Arc::new(Inner {
                channel,
                transport,
                handler: handler.clone(),
                lifetime: options.lifetime,
                reset_timer_on_button_press: options.reset_timer_on_button_press,
                deactivation_text: options.deactivation_text,
                state: Mutex::new(MessageState {
                    phase: Phase::Unsent,
                    content: options.content,
                    buttons,
                    rate_limited: false,
                    expired: false,
                    lifetime_timer: LifetimeTimer::new(),
                    rate_limit_timer: LifetimeTimer::new(),
                }),
                view: tokio::sync::Mutex::new(Box::new(view)),
                ready: Notify::new(),
                phase_tx,
            }),
        })
    }

    /// Creates a message whose buttons do nothing beyond resetting the timer.
    pub fn without_view(
        channel: ChannelId,
        transport: Arc<dyn MessageTransport>,
        handler: &InteractiveMessageHandler,
        options: MessageOptions,
    ) -> Result<Self> {
        Self::new(channel, transport, handler, options, StaticView)
    }

    fn state(&self) -> MutexGuard<'_, MessageState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, state: &mut MessageState, phase: Phase) {
        state.phase = phase;
        self.inner.phase_tx.send_replace(phase);
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state().phase
    }

    /// Transport id, present once the message has been posted.
    #[must_use]
    pub fn id(&self) -> Option<MessageId> {
        match self.phase() {
            Phase::Active(id) => Some(id),
            Phase::Deactivated(id) => id,
            Phase::Unsent | Phase::Sending => None,
        }
    }

    /// Target channel.
    #[must_use]
    pub fn channel(&self) -> ChannelId {
        self.inner.channel
    }

    /// Configured idle lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.inner.lifetime
    }

    /// Whether the message has been posted.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.id().is_some()
    }

    /// Whether the message has reached its terminal state.
    #[must_use]
    pub fn is_deactivated(&self) -> bool {
        matches!(self.phase(), Phase::Deactivated(_))
    }

    /// Whether edits are currently being dropped.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.state().rate_limited
    }

    /// Whether deactivation was caused by the lifetime running out.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.state().expired
    }

    /// Whether a lifetime countdown is pending.
    #[must_use]
    pub fn timer_armed(&self) -> bool {
        self.state().lifetime_timer.is_armed()
    }

    /// Snapshot of the current content.
    #[must_use]
    pub fn content(&self) -> Option<Content> {
        self.state().content.clone()
    }

    /// Emojis of every enabled button. This is the set the handler routes.
    #[must_use]
    pub fn active_button_emojis(&self) -> Vec<String> {
        self.state().buttons.active_emojis()
    }

    /// Whether `emoji` belongs to an enabled button.
    #[must_use]
    pub fn is_button_active(&self, emoji: &str) -> bool {
        self.state().buttons.is_active(emoji)
    }

    /// Snapshot of the named button.
    #[must_use]
    pub fn button(&self, name: &str) -> Option<Button> {
        self.state().buttons.by_name(name).cloned()
    }

    /// `(emoji, help)` for every enabled button that has help text.
    #[must_use]
    pub fn button_help(&self) -> Vec<(String, String)> {
        self.state()
            .buttons
            .iter()
            .filter(|button| !button.disabled)
            .filter_map(|button| {
                button
                    .help_message
                    .clone()
                    .map(|help| (button.emoji.clone(), help))
            })
            .collect()
    }

    /// Registers a button. If the message is live its reaction is attached right away.
    pub async fn add_button(&self, button: Button) -> Result<()> {
        let emoji = button.emoji.clone();
        let live = {
            let mut state = self.state();
            state.buttons.add(button)?;
            match state.phase {
                Phase::Active(id) => Some(id),
                _ => None,
            }
        };
        if let Some(id) = live {
            self.attach_reaction(id, &emoji).await?;
        }
        Ok(())
    }

    /// Enables the named button.
    pub fn enable_button(&self, name: &str) -> Result<()> {
        self.state().buttons.enable(name)
    }

    /// Disables the named button. Its reaction stays but is no longer routed.
    pub fn disable_button(&self, name: &str) -> Result<()> {
        self.state().buttons.disable(name)
    }

    /// Replaces the help text of the named button.
    pub fn set_button_help_message(&self, name: &str, help: Option<String>) -> Result<()> {
        self.state().buttons.set_help_message(name, help)
    }

    async fn attach_reaction(&self, id: MessageId, emoji: &str) -> Result<()> {
        self.inner
            .transport
            .react(self.inner.channel, id, emoji)
            .await
            .map_err(|e| {
                warn!("Failed to attach reaction {} to message {}: {}", emoji, id, e);
                Error::ReactionAttach {
                    emoji: emoji.to_string(),
                    reason: e.0,
                }
            })
    }

    /// Replaces the content and, if the message is live, edits it.
    ///
    /// Silently does nothing while deactivated or rate limited. Edit failures are
    /// logged and dropped; the displayed content just goes stale.
    pub async fn set_content(&self, content: impl Into<Content>) {
        let content = content.into();
        let live = {
            let mut state = self.state();
            if matches!(state.phase, Phase::Deactivated(_)) {
                debug!("Dropping content update for deactivated message");
                return;
            }
            if state.rate_limited {
                debug!("Dropping content update for rate-limited message");
                return;
            }
            state.content = Some(content.clone());
            match state.phase {
                Phase::Active(id) => Some(id),
                _ => None,
            }
        };
        self.inner.ready.notify_waiters();

        if let Some(id) = live {
            self.edit(id, &content).await;
        }
    }

    async fn try_edit(&self, id: MessageId, content: &Content) -> Result<()> {
        self.inner
            .transport
            .edit(self.inner.channel, id, content)
            .await
            .map_err(|e| Error::Edit { reason: e.0 })
    }

    /// Best-effort edit: failures are logged and the shown content goes stale.
    async fn edit(&self, id: MessageId, content: &Content) {
        if let Err(e) = self.try_edit(id, content).await {
            warn!("Message {}: {}", id, e);
        }
    }

    async fn wait_until_ready(&self) -> Result<Content> {
        loop {
            let notified = self.inner.ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let state = self.state();
                if matches!(state.phase, Phase::Deactivated(_)) {
                    return Err(Error::Deactivated);
                }
                if let Some(content) = &state.content {
                    return Ok(content.clone());
                }
            }
            notified.await;
        }
    }

    /// Posts the message, registers it with the handler, attaches one reaction per
    /// button in registration order and starts the lifetime countdown.
    ///
    /// Waits for content if none is available yet. If the transport produces no
    /// message this fails with `MessageSend` and the message stays unsent and
    /// unregistered. A failed reaction is reported as `ReactionAttach` after the
    /// message is already live.
    #[instrument(skip(self), fields(channel = %self.inner.channel))]
    pub async fn send(&self) -> Result<MessageId> {
        {
            let mut state = self.state();
            match state.phase {
                Phase::Unsent => self.set_phase(&mut state, Phase::Sending),
                Phase::Deactivated(_) => return Err(Error::Deactivated),
                Phase::Sending | Phase::Active(_) => return Err(Error::AlreadySent),
            }
        }

        let content = match self.prepare_content().await {
            Ok(content) => content,
            Err(e) => {
                self.revert_to_unsent();
                return Err(e);
            }
        };

        let sent = self.inner.transport.send(self.inner.channel, &content).await;
        let id = match sent {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.revert_to_unsent();
                return Err(Error::MessageSend {
                    reason: "transport returned no message".to_string(),
                });
            }
            Err(e) => {
                self.revert_to_unsent();
                return Err(Error::MessageSend { reason: e.0 });
            }
        };

        let outcome = {
            let mut state = self.state();
            if matches!(state.phase, Phase::Deactivated(_)) {
                // Deactivated while the send was in flight: annotate, never register.
                self.set_phase(&mut state, Phase::Deactivated(Some(id)));
                let annotated = state.content.as_mut().map(|current| {
                    current.append_trailer(&self.inner.deactivation_text);
                    current.clone()
                });
                SendOutcome::DeactivatedInFlight(annotated)
            } else {
                self.set_phase(&mut state, Phase::Active(id));
                let catch_up = state
                    .content
                    .as_ref()
                    .filter(|current| **current != content)
                    .cloned();
                SendOutcome::Live {
                    emojis: state.buttons.emojis(),
                    catch_up,
                }
            }
        };
        let (emojis, catch_up) = match outcome {
            SendOutcome::DeactivatedInFlight(annotated) => {
                if let Some(annotated) = annotated {
                    self.edit(id, &annotated).await;
                }
                return Ok(id);
            }
            SendOutcome::Live { emojis, catch_up } => (emojis, catch_up),
        };

        self.inner.handler.add_message(self.clone()).await;
        info!("Interactive message {} sent", id);

        if let Some(current) = catch_up {
            self.edit(id, &current).await;
        }

        let mut first_failure = None;
        for emoji in &emojis {
            if let Err(e) = self.attach_reaction(id, emoji).await {
                first_failure.get_or_insert(e);
            }
        }

        {
            let mut state = self.state();
            if matches!(state.phase, Phase::Active(_)) {
                self.arm_lifetime_timer(&mut state);
            }
        }

        first_failure.map_or(Ok(id), Err)
    }

    async fn prepare_content(&self) -> Result<Content> {
        if self.state().content.is_none() {
            let mut view = self.inner.view.lock().await;
            view.build(self).await?;
        }
        self.wait_until_ready().await
    }

    fn revert_to_unsent(&self) {
        let mut state = self.state();
        if state.phase == Phase::Sending {
            self.set_phase(&mut state, Phase::Unsent);
        }
    }

    fn arm_lifetime_timer(&self, state: &mut MessageState) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        state
            .lifetime_timer
            .arm(self.inner.lifetime, move |generation| async move {
                if let Some(inner) = weak.upgrade() {
                    let message = Self { inner };
                    message.lifetime_expired(generation).await;
                }
            });
    }

    async fn lifetime_expired(&self, generation: u64) {
        {
            let mut state = self.state();
            if !state.lifetime_timer.claim(generation) {
                return;
            }
            state.expired = true;
        }
        debug!("Interactive message lifetime expired");
        self.deactivate().await;
    }

    /// Restarts the lifetime countdown. Does nothing unless the message is live.
    pub fn reset_timer(&self) {
        let mut state = self.state();
        if matches!(state.phase, Phase::Active(_)) {
            self.arm_lifetime_timer(&mut state);
        }
    }

    /// Base press behaviour followed by the view's.
    ///
    /// Restarts the countdown when configured to, then hands the press to the view.
    /// A press on a deactivated message is ignored.
    pub async fn button_press(&self, name: &str, actor: &Actor) -> Result<()> {
        {
            let mut state = self.state();
            if matches!(state.phase, Phase::Deactivated(_)) {
                debug!("Ignoring press of `{}` on deactivated message", name);
                return Ok(());
            }
            if state.buttons.by_name(name).is_none() {
                return Err(Error::UnknownButtonName {
                    name: name.to_string(),
                });
            }
            if self.inner.reset_timer_on_button_press && matches!(state.phase, Phase::Active(_)) {
                self.arm_lifetime_timer(&mut state);
            }
        }

        let mut view = self.inner.view.lock().await;
        view.button_press(self, name, actor).await
    }

    /// Resolves `emoji` to its button and presses it.
    pub async fn emoji_press(&self, emoji: &str, actor: &Actor) -> Result<()> {
        let name = self.state().buttons.name_for_emoji(emoji)?;
        self.button_press(&name, actor).await
    }

    /// Drops edits for `timeout`. Ignored once deactivated.
    pub fn apply_rate_limit(&self, timeout: Duration) {
        let mut state = self.state();
        if matches!(state.phase, Phase::Deactivated(_)) {
            return;
        }
        state.rate_limited = true;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        state.rate_limit_timer.arm(timeout, move |generation| async move {
            if let Some(inner) = weak.upgrade() {
                let message = Self { inner };
                let mut state = message.state();
                if state.rate_limit_timer.claim(generation) {
                    state.rate_limited = false;
                }
            }
        });
        debug!("Message rate limited for {:?}", timeout);
    }

    /// Terminal transition.
    ///
    /// Annotates the trailer with the deactivation text (bypassing the guards that
    /// make `set_content` a no-op), cancels the countdown, publishes the new phase and
    /// finally unregisters from the handler. Calling it again does nothing.
    pub async fn deactivate(&self) {
        let (id, annotated) = {
            let mut state = self.state();
            let id = match state.phase {
                Phase::Deactivated(_) => return,
                Phase::Active(id) => Some(id),
                Phase::Unsent | Phase::Sending => None,
            };
            state.lifetime_timer.cancel();
            state.rate_limit_timer.cancel();
            state.rate_limited = false;
            self.set_phase(&mut state, Phase::Deactivated(id));

            let annotated = match (id, state.content.as_mut()) {
                (Some(_), Some(current)) => {
                    current.append_trailer(&self.inner.deactivation_text);
                    Some(current.clone())
                }
                _ => None,
            };
            (id, annotated)
        };
        self.inner.ready.notify_waiters();

        if let (Some(id), Some(annotated)) = (id, annotated) {
            self.edit(id, &annotated).await;
        }

        if let Some(id) = id {
            info!("Interactive message {} deactivated", id);
            self.inner.handler.remove_message(id).await;
        }
    }

    /// Watches lifecycle transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.inner.phase_tx.subscribe()
    }

    /// Resolves once the message is deactivated.
    pub async fn wait_for_deactivation(&self) {
        let mut rx = self.inner.phase_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|phase| matches!(phase, Phase::Deactivated(_))).await;
    }
}
