//! Chat message content value object.

use super::error::InvalidContent;

/// Non-empty chat message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(content: String) -> Result<Self, InvalidContent> {
        if content.is_empty() {
            return Err(InvalidContent);
        }
        Ok(Self(content))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = InvalidContent;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<Option<String>> for MessageContent {
    type Error = InvalidContent;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        value.ok_or(InvalidContent).and_then(Self::new)
    }
}
