//! Renderable payload of an interactive message.
//!
//! `Content` is deliberately transport-neutral: the bot layer converts it into
//! serenity builders, tests compare it directly.

/// One name/value pair inside an embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    /// Field heading
    pub name: String,
    /// Field body
    pub value: String,
    /// Whether the field may share a row with its neighbours
    pub inline: bool,
}

/// Rich embed, the usual body of an interactive message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    /// Embed title
    pub title: Option<String>,
    /// Main text block
    pub description: Option<String>,
    /// Fields shown below the description
    pub fields: Vec<EmbedField>,
    /// Footer (trailer) text
    pub footer: Option<String>,
    /// Side bar colour
    pub colour: Option<u32>,
}

impl Embed {
    /// Creates an empty embed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    /// Sets the footer text.
    #[must_use]
    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Sets the colour.
    #[must_use]
    pub const fn colour(mut self, colour: u32) -> Self {
        self.colour = Some(colour);
        self
    }

    /// Adds a line to the footer, keeping whatever was there before.
    pub fn append_footer(&mut self, line: &str) {
        self.footer = Some(match self.footer.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{line}"),
            _ => line.to_string(),
        });
    }
}

/// What an interactive message displays: plain text, an embed, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Content {
    /// Plain message text
    pub text: Option<String>,
    /// Embed body
    pub embed: Option<Embed>,
}

impl Content {
    /// Plain-text content.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            embed: None,
        }
    }

    /// Embed-only content.
    #[must_use]
    pub const fn embed(embed: Embed) -> Self {
        Self {
            text: None,
            embed: Some(embed),
        }
    }

    /// Trailer text: the embed footer, or the plain text when there is no embed.
    #[must_use]
    pub fn trailer(&self) -> Option<&str> {
        match &self.embed {
            Some(embed) => embed.footer.as_deref(),
            None => self.text.as_deref(),
        }
    }

    /// Appends `line` to the trailer region, separated from earlier trailer text by a newline.
    pub fn append_trailer(&mut self, line: &str) {
        if let Some(embed) = self.embed.as_mut() {
            embed.append_footer(line);
            return;
        }
        self.text = Some(match self.text.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{line}"),
            _ => line.to_string(),
        });
    }
}

impl From<Embed> for Content {
    fn from(embed: Embed) -> Self {
        Self::embed(embed)
    }
}
