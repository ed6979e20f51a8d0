use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    Document,
}

impl MediaKind {
    /// Classifies a sniffed MIME type by substring, checking image, audio, video
    /// and finally `application` (documents) in that order.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime.contains("image") {
            Some(Self::Image)
        } else if mime.contains("audio") {
            Some(Self::Audio)
        } else if mime.contains("video") {
            Some(Self::Video)
        } else if mime.contains("application") {
            Some(Self::Document)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locator and key material returned by the transport after an upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub url: String,
    pub direct_path: String,
    pub media_key: Vec<u8>,
    pub file_enc_sha256: Vec<u8>,
    pub file_sha256: Vec<u8>,
    pub file_length: u64,
}

// Key material stays out of logs.
impl fmt::Debug for UploadedMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedMedia")
            .field("url", &self.url)
            .field("direct_path", &self.direct_path)
            .field("file_length", &self.file_length)
            .finish_non_exhaustive()
    }
}

/// Transport-ready content of one message.
///
/// Audio and documents carry no caption, matching the protocol's message shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text { body: String },
    Image { caption: String, mime: String, media: UploadedMedia },
    Audio { mime: String, media: UploadedMedia },
    Video { caption: String, mime: String, media: UploadedMedia },
    Document { mime: String, media: UploadedMedia },
}

impl Payload {
    /// Wraps uploaded media into the variant matching `kind`.
    #[must_use]
    pub fn media(kind: MediaKind, caption: String, mime: String, media: UploadedMedia) -> Self {
        match kind {
            MediaKind::Image => Self::Image { caption, mime, media },
            MediaKind::Audio => Self::Audio { mime, media },
            MediaKind::Video => Self::Video { caption, mime, media },
            MediaKind::Document => Self::Document { mime, media },
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Audio { .. } => "audio",
            Self::Video { .. } => "video",
            Self::Document { .. } => "document",
        }
    }

    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        match self {
            Self::Text { body } => Some(body),
            Self::Image { caption, .. } | Self::Video { caption, .. } => Some(caption),
            Self::Audio { .. } | Self::Document { .. } => None,
        }
    }
}
