//! Reference-image attachment: type check, async read, base64 encoding, and the
//! preview references handed to the presentation layer.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::{PhotorealError, Result};
use crate::models::AttachmentPayload;

/// A file the user picked, before anything has been read from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub path: PathBuf,
}

impl SelectedFile {
    /// Builds a selection whose media type is guessed from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let media_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        Self::with_media_type(path, media_type)
    }

    pub fn with_media_type(path: impl AsRef<Path>, media_type: impl Into<String>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            media_type: media_type.into(),
            path: path.to_path_buf(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// Holds the bytes behind live preview URLs until they are revoked.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    entries: Arc<Mutex<HashMap<String, Arc<Vec<u8>>>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, bytes: Arc<Vec<u8>>) -> PreviewUrl {
        let url = format!("blob:photoreal/{}", Uuid::new_v4());
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(url.clone(), bytes);
        }
        log::trace!("Created preview {}", url);
        PreviewUrl {
            url,
            registry: self.clone(),
        }
    }

    pub fn resolve(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(url).cloned())
    }

    pub fn live_count(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    fn revoke(&self, url: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.remove(url).is_some() {
                log::trace!("Revoked preview {}", url);
            }
        }
    }
}

/// A preview reference; revoked from its registry when dropped.
#[derive(Debug)]
pub struct PreviewUrl {
    url: String,
    registry: PreviewRegistry,
}

impl PreviewUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewUrl {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}

#[derive(Debug)]
pub struct AttachedImage {
    pub file: SelectedFile,
    pub base64: String,
    pub byte_len: usize,
    preview: PreviewUrl,
}

impl AttachedImage {
    pub fn mime_type(&self) -> &str {
        &self.file.media_type
    }

    pub fn preview_url(&self) -> &str {
        self.preview.as_str()
    }

    pub fn payload(&self) -> AttachmentPayload {
        AttachmentPayload {
            base64: self.base64.clone(),
            mime_type: self.file.media_type.clone(),
        }
    }
}

/// Holds at most one active attachment.
#[derive(Debug, Default)]
pub struct AttachmentSlot {
    current: Option<AttachedImage>,
    previews: PreviewRegistry,
}

impl AttachmentSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and encodes `file`, replacing any current attachment once the read succeeds.
    /// A rejected or unreadable file leaves the slot unchanged.
    pub async fn attach(&mut self, file: SelectedFile) -> Result<&AttachedImage> {
        if !file.is_image() {
            log::warn!(
                "Rejected attachment '{}' with media type {}",
                file.name,
                file.media_type
            );
            return Err(PhotorealError::InvalidFileType(file.media_type));
        }

        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| PhotorealError::FileReadError(format!("{}: {}", file.path.display(), e)))?;

        let base64 = BASE64.encode(&bytes);
        let byte_len = bytes.len();

        self.detach();
        let preview = self.previews.create(Arc::new(bytes));
        log::info!(
            "Attached '{}' ({}, {} bytes); edit mode enabled",
            file.name,
            file.media_type,
            byte_len
        );

        Ok(&*self.current.insert(AttachedImage {
            file,
            base64,
            byte_len,
            preview,
        }))
    }

    pub fn detach(&mut self) {
        if let Some(previous) = self.current.take() {
            log::info!("Detached '{}'", previous.file.name);
        }
    }

    pub fn current(&self) -> Option<&AttachedImage> {
        self.current.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.current.is_some()
    }

    pub fn payload(&self) -> Option<AttachmentPayload> {
        self.current.as_ref().map(AttachedImage::payload)
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }
}
