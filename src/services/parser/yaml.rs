use crate::domain::message::Message;
use crate::error::{AppError, Result};
use crate::services::parser::BatchDecoder;

/// Decodes a YAML sequence of message mappings.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDecoder;

impl BatchDecoder for YamlDecoder {
    fn decode(&self, body: &[u8]) -> Result<Vec<Message>> {
        let text = std::str::from_utf8(body).map_err(|e| {
            tracing::warn!(error = %e, parser = "yaml", "The batch is not valid UTF-8");
            AppError::Format(e.to_string())
        })?;

        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        // A bare `~` or `null` document is an empty batch.
        serde_yaml::from_str::<Option<Vec<Message>>>(text).map(Option::unwrap_or_default).map_err(|e| {
            tracing::warn!(error = %e, parser = "yaml", "The batch is not in the expected format");
            AppError::Format(e.to_string())
        })
    }
}
