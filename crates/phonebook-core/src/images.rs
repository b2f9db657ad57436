//! Data-URL handling for studio images.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::info;

use crate::error::ApiError;

/// File extension for the MIME type in a data URL; jpg when unknown
pub fn extension_for(data_url: &str) -> &'static str {
    let mime = mime_of(data_url).unwrap_or_default().to_lowercase();
    if mime.contains("jpeg") {
        "jpg"
    } else if mime.contains("png") {
        "png"
    } else if mime.contains("webp") {
        "webp"
    } else if mime.contains("gif") {
        "gif"
    } else {
        "jpg"
    }
}

fn mime_of(data_url: &str) -> Option<&str> {
    let rest = data_url.strip_prefix("data:")?;
    let header = rest.split(',').next()?;
    let mime = header.split(';').next()?;
    mime.starts_with("image/").then_some(mime)
}

/// Decode the base64 payload of a `data:image/...;base64,` URL
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, ApiError> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or_else(|| ApiError::Image("missing data URL separator".to_string()))?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(ApiError::Image(format!("unsupported data URL header {:?}", header)));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| ApiError::Image(e.to_string()))
}

/// MIME type to send for an attachment, guessed from its extension
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/png",
    }
}

/// Decode each data URL and write it under `dir` as `image_<millis>_<n>.<ext>`
pub async fn save_images(data_urls: &[String], dir: &Path) -> Result<Vec<PathBuf>, ApiError> {
    if data_urls.is_empty() {
        return Ok(Vec::new());
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ApiError::io(format!("creating {}", dir.display()), e))?;

    let stamp = chrono::Utc::now().timestamp_millis();
    let mut saved = Vec::with_capacity(data_urls.len());
    for (i, url) in data_urls.iter().enumerate() {
        let bytes = decode_data_url(url)?;
        let path = dir.join(format!("image_{}_{}.{}", stamp, i, extension_for(url)));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ApiError::io(format!("writing {}", path.display()), e))?;
        saved.push(path);
    }

    info!(count = saved.len(), dir = %dir.display(), "saved studio images");
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extension_for_known_and_unknown_types() {
        assert_eq!(extension_for("data:image/jpeg;base64,AAAA"), "jpg");
        assert_eq!(extension_for("data:image/png;base64,AAAA"), "png");
        assert_eq!(extension_for("data:image/webp;base64,AAAA"), "webp");
        assert_eq!(extension_for("data:image/gif;base64,AAAA"), "gif");
        assert_eq!(extension_for("data:image/bmp;base64,AAAA"), "jpg");
        assert_eq!(extension_for("not a data url"), "jpg");
    }

    #[test]
    fn test_decode_data_url() {
        assert_eq!(decode_data_url("data:image/png;base64,aGk=").unwrap(), b"hi");
        assert!(decode_data_url("data:image/png,plain").is_err());
        assert!(decode_data_url("no separator").is_err());
        assert!(decode_data_url("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a/photo.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("b.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("noext")), "image/png");
    }

    #[tokio::test]
    async fn test_save_images_writes_decoded_files() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let urls = vec![
            "data:image/png;base64,aGk=".to_string(),
            "data:image/gif;base64,eW8=".to_string(),
        ];

        let saved = save_images(&urls, &out).await.unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].extension().unwrap(), "png");
        assert_eq!(saved[1].extension().unwrap(), "gif");
        assert_eq!(std::fs::read(&saved[0]).unwrap(), b"hi");
        assert_eq!(std::fs::read(&saved[1]).unwrap(), b"yo");
    }

    #[tokio::test]
    async fn test_save_images_empty_is_noop() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("never-created");
        assert!(save_images(&[], &out).await.unwrap().is_empty());
        assert!(!out.exists());
    }
}
