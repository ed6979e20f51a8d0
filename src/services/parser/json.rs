use crate::domain::message::Message;
use crate::error::{AppError, Result};
use crate::services::parser::{BatchDecoder, legacy};
use std::borrow::Cow;

/// Decodes a JSON array of message objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder {
    recover_legacy_encoding: bool,
}

impl JsonDecoder {
    #[must_use]
    pub const fn new(recover_legacy_encoding: bool) -> Self {
        Self { recover_legacy_encoding }
    }
}

impl BatchDecoder for JsonDecoder {
    fn decode(&self, body: &[u8]) -> Result<Vec<Message>> {
        let body = if self.recover_legacy_encoding {
            Cow::Owned(legacy::recover(body).inspect_err(|e| {
                tracing::warn!(error = %e, parser = "json", "Could not recover legacy encoded body");
            })?)
        } else {
            Cow::Borrowed(body)
        };

        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(error = %e, parser = "json", "The batch is not in the expected format");
            AppError::Format(e.to_string())
        })
    }
}
