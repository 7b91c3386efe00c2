use std::io;
use std::path::Path;

use base64ct::{Base64, Encoding};
use uuid::Uuid;

const IMAGE_DIR: &str = "recipes/images";

/// Image bytes decoded from a `data:image/<type>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

pub fn decode_data_uri(input: &str) -> Result<DecodedImage, &'static str> {
    let rest = input
        .trim()
        .strip_prefix("data:image/")
        .ok_or("Image must be a data:image/...;base64 URI")?;
    let (format, payload) = rest
        .split_once(";base64,")
        .ok_or("Image must be base64 encoded")?;

    let extension = match format.to_ascii_lowercase().as_str() {
        "png" => "png",
        "jpeg" | "jpg" => "jpg",
        "gif" => "gif",
        "webp" => "webp",
        _ => return Err("Unsupported image type"),
    };

    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = Base64::decode_vec(&payload).map_err(|_| "Image is not valid base64")?;
    if bytes.is_empty() {
        return Err("Image is empty");
    }

    Ok(DecodedImage { extension, bytes })
}

/// Write the image under `media_root` and return its path relative to it.
pub async fn save(media_root: &Path, image: &DecodedImage) -> io::Result<String> {
    let relative = format!("{IMAGE_DIR}/{}.{}", Uuid::new_v4(), image.extension);
    let full = media_root.join(&relative);
    if let Some(parent) = full.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&full, &image.bytes).await?;
    Ok(relative)
}

/// Best-effort removal; a missing file is not an error worth surfacing.
pub async fn remove(media_root: &Path, relative: &str) {
    if let Err(e) = tokio::fs::remove_file(media_root.join(relative)).await {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = relative, error = %e, "failed to remove recipe image");
        }
    }
}

pub fn media_url(relative: &str) -> String {
    format!("/media/{relative}")
}
