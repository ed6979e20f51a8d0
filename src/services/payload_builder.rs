use crate::adapters::transport::Transport;
use crate::domain::message::Message;
use crate::domain::payload::{MediaKind, Payload};
use crate::error::{AppError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

const TEXT_PLAIN: &str = "text/plain";
const OCTET_STREAM: &str = "application/octet-stream";
const APPLICATION_JSON: &str = "application/json";
const IMAGE_SVG: &str = "image/svg+xml";

/// Only the head of an attachment is inspected for text and SVG markers.
const SNIFF_LEN: usize = 3072;

/// UTF-32 BE/LE, UTF-8 and UTF-16 BE/LE.
const BYTE_ORDER_MARKS: [&[u8]; 5] =
    [&[0x00, 0x00, 0xfe, 0xff], &[0xff, 0xfe, 0x00, 0x00], &[0xef, 0xbb, 0xbf], &[0xfe, 0xff], &[0xff, 0xfe]];

/// Decodes a standard, padded base64 attachment. Line breaks inside the value
/// are ignored.
///
/// # Errors
/// Returns `AppError::Decode` if the value is not valid base64.
pub fn decode_attachment(encoded: &str) -> Result<Vec<u8>> {
    if encoded.contains(['\r', '\n']) {
        let joined: String = encoded.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        return Ok(STANDARD.decode(joined)?);
    }
    Ok(STANDARD.decode(encoded)?)
}

/// Detects a MIME type from the content itself.
///
/// SVG documents are recognised first, then binary signatures. Anything else is
/// text when it starts with a byte order mark or holds no binary control bytes:
/// a JSON object or array is `application/json`, other text is `text/plain`.
/// The rest is `application/octet-stream`.
#[must_use]
pub fn sniff_mime(data: &[u8]) -> &'static str {
    let head = &data[..data.len().min(SNIFF_LEN)];
    let text = BYTE_ORDER_MARKS.iter().any(|mark| head.starts_with(mark))
        || !head.iter().any(|&byte| is_binary_byte(byte));

    if text && head.windows(4).any(|window| window == b"<svg") {
        return IMAGE_SVG;
    }
    if let Some(kind) = infer::get(data) {
        return kind.mime_type();
    }
    if !text {
        return OCTET_STREAM;
    }
    if is_json(data) { APPLICATION_JSON } else { TEXT_PLAIN }
}

const fn is_binary_byte(byte: u8) -> bool {
    matches!(byte, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f)
}

fn is_json(data: &[u8]) -> bool {
    let starts_structured = data.iter().find(|b| !b.is_ascii_whitespace()).is_some_and(|&b| matches!(b, b'{' | b'['));
    starts_structured && serde_json::from_slice::<serde::de::IgnoredAny>(data).is_ok()
}

#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    transport: Arc<dyn Transport>,
}

impl PayloadBuilder {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Builds the payload for a message, uploading its attachment if it has one.
    ///
    /// # Errors
    /// Returns `AppError::Decode` for an invalid attachment encoding,
    /// `AppError::UnsupportedMediaType` if the sniffed type maps to no media kind,
    /// and `AppError::Upload` if the transport refuses the upload.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self, message),
        fields(mime = tracing::field::Empty, attachment_size = tracing::field::Empty)
    )]
    pub async fn build(&self, message: &Message) -> Result<Payload> {
        if !message.has_attachment() {
            return Ok(Payload::Text { body: message.content.clone() });
        }

        let data = decode_attachment(&message.attachment)?;
        let mime = sniff_mime(&data);
        tracing::Span::current().record("mime", mime);
        tracing::Span::current().record("attachment_size", data.len());

        let kind = MediaKind::from_mime(mime).ok_or_else(|| AppError::UnsupportedMediaType(mime.to_string()))?;

        let media = self.transport.upload(data, kind).await.map_err(AppError::Upload)?;
        tracing::debug!(kind = %kind, url = %media.url, "Attachment uploaded");

        Ok(Payload::media(kind, message.content.clone(), mime.to_string(), media))
    }
}
