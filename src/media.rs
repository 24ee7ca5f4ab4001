//! Media storage
//!
//! Uploaded music files, posters and profile images. Files are written
//! under a local root and served back by the owning service under a fixed
//! URL prefix.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};

/// A file received from a multipart upload
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Sub-directory below the store root (empty for the root itself)
    pub folder: String,
    /// File name as sent by the client
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Media storage errors
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid folder: {0}")]
    InvalidFolder(String),
}

/// Destination for uploaded files
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist the upload and return the URL it is reachable at
    async fn put(&self, upload: MediaUpload) -> Result<String, MediaError>;
}

/// Stores uploads on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn put(&self, upload: MediaUpload) -> Result<String, MediaError> {
        let folder = upload.folder.trim_matches('/');
        if folder.split('/').any(|part| part == ".." || part == ".") {
            return Err(MediaError::InvalidFolder(upload.folder));
        }

        let stored_name = stored_file_name(&upload.file_name, &upload.bytes);
        let dir = if folder.is_empty() {
            self.root.clone()
        } else {
            self.root.join(folder)
        };

        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&stored_name), &upload.bytes).await?;

        tracing::debug!(
            folder = %folder,
            file = %stored_name,
            size = upload.bytes.len(),
            content_type = ?upload.content_type,
            "Stored upload"
        );

        Ok(if folder.is_empty() {
            format!("{}/{}", self.url_prefix, stored_name)
        } else {
            format!("{}/{}/{}", self.url_prefix, folder, stored_name)
        })
    }
}

/// Strip any client-supplied path and keep a conservative character set
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Content-hash prefixed name so repeated uploads of one file name don't clobber each other
fn stored_file_name(file_name: &str, bytes: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    format!("{}-{}", &digest[..16], sanitize_file_name(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("song.mp3"), "song.mp3");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\music\\my song.mp3"), "my_song.mp3");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[test]
    fn test_stored_file_name_is_content_addressed() {
        let a = stored_file_name("a.png", b"one");
        let b = stored_file_name("a.png", b"two");
        assert_ne!(a, b);
        assert!(a.ends_with("-a.png"));
        assert_eq!(a, stored_file_name("a.png", b"one"));
    }

    #[tokio::test]
    async fn test_local_store_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path(), "/media/");

        let url = store
            .put(MediaUpload {
                folder: "posters".to_string(),
                file_name: "cover.png".to_string(),
                content_type: Some("image/png".to_string()),
                bytes: Bytes::from_static(b"png-bytes"),
            })
            .await
            .unwrap();

        assert!(url.starts_with("/media/posters/"));
        assert!(url.ends_with("-cover.png"));

        let name = url.rsplit('/').next().unwrap();
        let written = std::fs::read(dir.path().join("posters").join(name)).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn test_local_store_rejects_traversal_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path(), "/media");

        let result = store
            .put(MediaUpload {
                folder: "../outside".to_string(),
                file_name: "x.bin".to_string(),
                content_type: None,
                bytes: Bytes::from_static(b"x"),
            })
            .await;

        assert!(matches!(result, Err(MediaError::InvalidFolder(_))));
    }
}
