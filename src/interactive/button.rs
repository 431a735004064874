//! Emoji-keyed buttons and the per-message registry that owns them.
//!
//! Buttons are only ever added. Once a reaction is attached to a live message it
//! cannot be un-rendered, so "removing" a button is expressed by disabling it.

use crate::errors::{Error, Result};
use std::collections::HashMap;

/// A named, emoji-triggered affordance on an interactive message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Stable identifier used by views
    pub name: String,
    /// Reaction that triggers the button
    pub emoji: String,
    /// Disabled buttons keep their reaction but are not routed
    pub disabled: bool,
    /// Optional explanation shown to users
    pub help_message: Option<String>,
}

impl Button {
    /// Creates an enabled button without help text.
    #[must_use]
    pub fn new(name: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emoji: emoji.into(),
            disabled: false,
            help_message: None,
        }
    }

    /// Sets the help text.
    #[must_use]
    pub fn help(mut self, help_message: impl Into<String>) -> Self {
        self.help_message = Some(help_message.into());
        self
    }

    /// Starts the button disabled.
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Registry of the buttons on one message.
///
/// Keyed by emoji, with a name index next to it. Registration order is kept so
/// reactions can be attached in the order buttons were added.
#[derive(Debug, Default, Clone)]
pub struct ButtonSet {
    buttons: HashMap<String, Button>,
    names: HashMap<String, String>,
    order: Vec<String>,
}

impl ButtonSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a button.
    ///
    /// Fails with `DuplicateButton` if either the name or the emoji is taken; the set
    /// is left untouched in that case.
    pub fn add(&mut self, button: Button) -> Result<()> {
        if self.names.contains_key(&button.name) || self.buttons.contains_key(&button.emoji) {
            return Err(Error::DuplicateButton {
                name: button.name,
                emoji: button.emoji,
            });
        }
        self.names.insert(button.name.clone(), button.emoji.clone());
        self.order.push(button.emoji.clone());
        self.buttons.insert(button.emoji.clone(), button);
        Ok(())
    }

    /// Looks a button up by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Button> {
        self.names.get(name).and_then(|emoji| self.buttons.get(emoji))
    }

    /// Looks a button up by emoji.
    #[must_use]
    pub fn by_emoji(&self, emoji: &str) -> Option<&Button> {
        self.buttons.get(emoji)
    }

    fn by_name_mut(&mut self, name: &str) -> Result<&mut Button> {
        let emoji = self.names.get(name).ok_or_else(|| Error::UnknownButtonName {
            name: name.to_string(),
        })?;
        self.buttons
            .get_mut(emoji)
            .ok_or_else(|| Error::UnknownButtonName {
                name: name.to_string(),
            })
    }

    /// Resolves an emoji to the name of its button.
    pub fn name_for_emoji(&self, emoji: &str) -> Result<String> {
        self.buttons
            .get(emoji)
            .map(|button| button.name.clone())
            .ok_or_else(|| Error::UnknownButton {
                emoji: emoji.to_string(),
            })
    }

    /// Enables the named button.
    pub fn enable(&mut self, name: &str) -> Result<()> {
        self.by_name_mut(name)?.disabled = false;
        Ok(())
    }

    /// Disables the named button.
    pub fn disable(&mut self, name: &str) -> Result<()> {
        self.by_name_mut(name)?.disabled = true;
        Ok(())
    }

    /// Replaces the help text of the named button.
    pub fn set_help_message(&mut self, name: &str, help_message: Option<String>) -> Result<()> {
        self.by_name_mut(name)?.help_message = help_message;
        Ok(())
    }

    /// Emojis of every enabled button, in registration order.
    #[must_use]
    pub fn active_emojis(&self) -> Vec<String> {
        self.iter()
            .filter(|button| !button.disabled)
            .map(|button| button.emoji.clone())
            .collect()
    }

    /// Whether `emoji` belongs to an enabled button.
    #[must_use]
    pub fn is_active(&self, emoji: &str) -> bool {
        self.buttons.get(emoji).is_some_and(|button| !button.disabled)
    }

    /// Every emoji in registration order, enabled or not.
    #[must_use]
    pub fn emojis(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Iterates over buttons in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Button> {
        self.order.iter().filter_map(|emoji| self.buttons.get(emoji))
    }

    /// Number of registered buttons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no buttons are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn arrows() -> ButtonSet {
        let mut set = ButtonSet::new();
        set.add(Button::new("left", "⬅️")).unwrap();
        set.add(Button::new("right", "➡️")).unwrap();
        set
    }

    #[test]
    fn test_duplicate_name_rejected_and_set_unchanged() {
        let mut set = arrows();
        let result = set.add(Button::new("left", "🔥"));
        assert!(matches!(result, Err(Error::DuplicateButton { .. })));
        assert_eq!(set.len(), 2);
        assert!(set.by_emoji("🔥").is_none());
        assert_eq!(set.by_name("left").unwrap().emoji, "⬅️");
    }

    #[test]
    fn test_duplicate_emoji_rejected_and_set_unchanged() {
        let mut set = arrows();
        let result = set.add(Button::new("back", "⬅️"));
        assert!(matches!(result, Err(Error::DuplicateButton { .. })));
        assert_eq!(set.len(), 2);
        assert!(set.by_name("back").is_none());
        assert_eq!(set.by_emoji("⬅️").unwrap().name, "left");
    }

    #[test]
    fn test_duplicate_sequences_never_change_the_set() {
        let mut set = ButtonSet::new();
        let attempts = [
            ("a", "1️⃣"),
            ("b", "2️⃣"),
            ("a", "3️⃣"),
            ("c", "1️⃣"),
            ("c", "3️⃣"),
            ("b", "3️⃣"),
        ];
        let mut accepted = 0;
        for (name, emoji) in attempts {
            let before = set.emojis();
            match set.add(Button::new(name, emoji)) {
                Ok(()) => accepted += 1,
                Err(Error::DuplicateButton { .. }) => assert_eq!(set.emojis(), before),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(accepted, 3);
        assert_eq!(set.emojis(), vec!["1️⃣", "2️⃣", "3️⃣"]);
    }

    #[test]
    fn test_active_emojis_skip_disabled_buttons() {
        let mut set = arrows();
        set.add(Button::new("stop", "⏹️").disabled()).unwrap();
        assert_eq!(set.active_emojis(), vec!["⬅️", "➡️"]);

        set.disable("left").unwrap();
        set.enable("stop").unwrap();
        assert_eq!(set.active_emojis(), vec!["➡️", "⏹️"]);
        assert!(!set.is_active("⬅️"));
        assert!(set.is_active("⏹️"));
    }

    #[test]
    fn test_unknown_names_and_emojis() {
        let mut set = arrows();
        assert!(matches!(
            set.enable("up"),
            Err(Error::UnknownButtonName { .. })
        ));
        assert!(matches!(
            set.set_help_message("up", None),
            Err(Error::UnknownButtonName { .. })
        ));
        assert!(matches!(
            set.name_for_emoji("🔥"),
            Err(Error::UnknownButton { .. })
        ));
        assert_eq!(set.name_for_emoji("➡️").unwrap(), "right");
    }

    #[test]
    fn test_help_message_update() {
        let mut set = arrows();
        set.set_help_message("right", Some("Next page".to_string()))
            .unwrap();
        assert_eq!(
            set.by_name("right").unwrap().help_message.as_deref(),
            Some("Next page")
        );
    }
}
