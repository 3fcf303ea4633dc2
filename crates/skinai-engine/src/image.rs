use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Base64 image payload ready for an `inlineData` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

/// Splits `data:<mime>;base64,<payload>`. Input without a data-URI header is
/// taken as a bare base64 payload.
pub fn split_data_uri(image_data: &str) -> InlineImage {
    let trimmed = image_data.trim();
    if let Some(rest) = trimmed.strip_prefix("data:") {
        if let Some((header, payload)) = rest.split_once(',') {
            let mime_type = header
                .split(';')
                .next()
                .map(str::trim)
                .filter(|value| value.starts_with("image/"))
                .unwrap_or(DEFAULT_IMAGE_MIME);
            return InlineImage {
                mime_type: mime_type.to_string(),
                data: payload.to_string(),
            };
        }
    }
    InlineImage {
        mime_type: DEFAULT_IMAGE_MIME.to_string(),
        data: trimmed.to_string(),
    }
}

/// Reads an image file and wraps it as a data URI, sniffing the format.
pub fn data_uri_from_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
    let format = match image::guess_format(&bytes) {
        Ok(format) => format,
        Err(_) => bail!("{} is not a recognised image", path.display()),
    };
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        BASE64.encode(&bytes)
    ))
}

/// Decoded photo bytes. Undecodable payloads fall back to their text bytes.
pub fn image_bytes(image_data: &str) -> Vec<u8> {
    let inline = split_data_uri(image_data);
    BASE64
        .decode(inline.data.as_bytes())
        .unwrap_or_else(|_| inline.data.into_bytes())
}

/// Hex SHA-256 of the photo, recorded in place of the photo itself.
pub fn image_digest(image_data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_bytes(image_data));
    hex::encode(hasher.finalize())
}
