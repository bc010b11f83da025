//! Outbound replies.

use std::fmt;

/// What a command sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain text, sent to the reply target.
    Text(String),
    /// A structured payload, sent to the reply target.
    Rich(RichPayload),
    /// A reaction placed on the message that invoked the command.
    Reaction(String),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Short name of the variant for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Rich(_) => "rich",
            Self::Reaction(_) => "reaction",
        }
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<RichPayload> for Reply {
    fn from(payload: RichPayload) -> Self {
        Self::Rich(payload)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Rich(payload) => write!(f, "{payload}"),
            Self::Reaction(reaction) => write!(f, "[{reaction}]"),
        }
    }
}

/// A titled block of fields with an optional footer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichPayload {
    pub title: String,
    pub description: String,
    pub fields: Vec<RichField>,
    pub footer: Option<String>,
}

/// One named section of a [`RichPayload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl RichPayload {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(RichField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

impl fmt::Display for RichPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
        }
        for field in &self.fields {
            writeln!(f, "{}", field.name)?;
            writeln!(f, "{}", field.value)?;
        }
        if let Some(footer) = &self.footer {
            write!(f, "-- {footer} --")?;
        }
        Ok(())
    }
}
