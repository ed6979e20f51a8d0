use crate::error::{AppError, Result};

const UTF8_BOM: &str = "\u{feff}";

/// Re-encodes UTF-16LE text as UTF-8.
///
/// Surrogate pairs are combined; unpaired surrogates become U+FFFD. A leading
/// byte order mark is dropped after re-encoding.
///
/// # Errors
/// Returns `AppError::InvalidEncoding` if the input has an odd number of bytes.
pub fn recover(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.len() % 2 != 0 {
        return Err(AppError::InvalidEncoding);
    }

    let units = bytes.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    let text: String =
        char::decode_utf16(units).map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER)).collect();

    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(&text).as_bytes().to_vec())
}
