use serde::{Deserialize, Deserializer};

/// One send intent decoded from a batch.
///
/// Absent or `null` fields decode as empty strings so that an incomplete
/// element is rejected by [`Message::is_valid`] rather than by the decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub recipient: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    /// Base64 encoded attachment bytes; empty means a plain text message.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attachment: String,
}

impl Message {
    #[must_use]
    pub fn text(recipient: impl Into<String>, content: impl Into<String>) -> Self {
        Self { recipient: recipient.into(), content: content.into(), attachment: String::new() }
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachment = attachment.into();
        self
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.recipient.is_empty() && !self.content.is_empty()
    }

    #[must_use]
    pub fn has_attachment(&self) -> bool {
        !self.attachment.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
