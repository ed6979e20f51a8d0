use crate::config::ParserConfig;
use crate::domain::message::Message;
use crate::error::{AppError, Result};

pub mod json;
pub mod legacy;
pub mod yaml;

pub use json::JsonDecoder;
pub use yaml::YamlDecoder;

/// Turns the raw bytes of one batch into messages, without validating them.
pub trait BatchDecoder: Send + Sync + std::fmt::Debug {
    /// # Errors
    /// Returns `AppError::Format` if the bytes are not a sequence of message records.
    fn decode(&self, body: &[u8]) -> Result<Vec<Message>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    Json,
    Yaml,
}

impl BatchFormat {
    /// Picks a format from a file extension or a `Content-Type` value by suffix.
    ///
    /// # Errors
    /// Returns `AppError::NoParserFound` if the hint ends with neither `json` nor `yaml`.
    pub fn from_hint(hint: &str) -> Result<Self> {
        if hint.ends_with("json") {
            Ok(Self::Json)
        } else if hint.ends_with("yaml") {
            Ok(Self::Yaml)
        } else {
            Err(AppError::NoParserFound)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchParser {
    json: JsonDecoder,
    yaml: YamlDecoder,
}

impl BatchParser {
    #[must_use]
    pub const fn new(config: &ParserConfig) -> Self {
        Self { json: JsonDecoder::new(config.recover_legacy_encoding), yaml: YamlDecoder }
    }

    /// Decodes and validates a whole batch. A single invalid element rejects the
    /// batch; nothing is returned for the valid ones.
    ///
    /// # Errors
    /// Returns `AppError::NoParserFound` for an unknown hint, the decoder's error
    /// for malformed input, and `AppError::Validation` for an empty required field.
    pub fn parse(&self, hint: &str, body: &[u8]) -> Result<Vec<Message>> {
        let format = BatchFormat::from_hint(hint)?;
        let decoder: &dyn BatchDecoder = match format {
            BatchFormat::Json => &self.json,
            BatchFormat::Yaml => &self.yaml,
        };

        let messages = decoder.decode(body)?;
        validate(&messages, format)?;
        Ok(messages)
    }
}

fn validate(messages: &[Message], format: BatchFormat) -> Result<()> {
    if let Some(index) = messages.iter().position(|m| !m.is_valid()) {
        tracing::warn!(parser = ?format, index, "Recipient or content field is empty");
        return Err(AppError::Validation);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hint_suffix_matching() {
        assert_eq!(BatchFormat::from_hint("application/json").unwrap(), BatchFormat::Json);
        assert_eq!(BatchFormat::from_hint("json").unwrap(), BatchFormat::Json);
        assert_eq!(BatchFormat::from_hint(".yaml").unwrap(), BatchFormat::Yaml);
        assert_eq!(BatchFormat::from_hint("application/x-yaml").unwrap(), BatchFormat::Yaml);

        assert!(matches!(BatchFormat::from_hint("csv"), Err(AppError::NoParserFound)));
        assert!(matches!(BatchFormat::from_hint("yml"), Err(AppError::NoParserFound)));
        assert!(matches!(BatchFormat::from_hint(""), Err(AppError::NoParserFound)));
        assert!(matches!(
            BatchFormat::from_hint("application/json; charset=utf-8"),
            Err(AppError::NoParserFound)
        ));
    }

    #[test]
    fn test_unknown_hint_fails_before_decoding() {
        let result = BatchParser::default().parse("csv", b"definitely not a batch");
        assert!(matches!(result, Err(AppError::NoParserFound)));
    }

    #[test]
    fn test_valid_batch_preserves_order() {
        let body = br#"[
            {"recipient":"Carol","content":"3"},
            {"recipient":"Alice","content":"1"},
            {"recipient":"Bob","content":"2"}
        ]"#;
        let messages = BatchParser::default().parse("application/json", body).unwrap();
        let recipients: Vec<_> = messages.iter().map(|m| m.recipient.as_str()).collect();

        assert_eq!(recipients, ["Carol", "Alice", "Bob"]);
    }

    #[test]
    fn test_one_empty_field_rejects_whole_batch() {
        let parser = BatchParser::default();

        let json = br#"[{"recipient":"Alice","content":"hi"},{"recipient":"","content":"hi"}]"#;
        assert!(matches!(parser.parse("json", json), Err(AppError::Validation)));

        let yaml = b"- recipient: Alice\n  content: hi\n- recipient: Bob\n";
        assert!(matches!(parser.parse("yaml", yaml), Err(AppError::Validation)));
    }

    #[test]
    fn test_legacy_recovery_is_off_by_default() {
        let body = br#"[{"recipient":"Alice","content":"hi"}]"#;

        let default_parser = BatchParser::new(&ParserConfig::default());
        assert_eq!(default_parser.parse("json", body).unwrap(), vec![Message::text("Alice", "hi")]);

        let recovering = BatchParser::new(&ParserConfig { recover_legacy_encoding: true });
        assert!(matches!(recovering.parse("json", body), Err(AppError::Format(_) | AppError::InvalidEncoding)));
    }

    #[test]
    fn test_legacy_recovery_never_applies_to_yaml() {
        let parser = BatchParser::new(&ParserConfig { recover_legacy_encoding: true });
        let messages = parser.parse("yaml", b"- recipient: Alice\n  content: hi\n").unwrap();
        assert_eq!(messages, vec![Message::text("Alice", "hi")]);
    }
}
