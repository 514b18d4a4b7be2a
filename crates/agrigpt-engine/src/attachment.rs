//! Image attachments and their preview handles.
//!
//! A chosen file gets an ephemeral preview handle from a [`PreviewStore`].
//! Handles are move-only: releasing one consumes it, so a handle can be
//! released at most once, and every path that retires an attachment must hand
//! its handle back to the store.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// An image chosen by the user, held in memory until it is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    /// File name sent in the multipart body.
    pub name: String,
    /// MIME type, e.g. `image/jpeg`.
    pub mime: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl AttachmentFile {
    /// Build an attachment from in-memory bytes.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read an attachment from disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let bytes = std::fs::read(path).map_err(AttachmentError::Io)?;
        if bytes.is_empty() {
            return Err(AttachmentError::Empty(path.display().to_string()));
        }
        let name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().to_string());
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self { name, mime, bytes })
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file has no contents.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encode the file as a `data:` URL that can be rendered without the
    /// original preview handle.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

/// Errors reading an attachment.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but has no contents.
    #[error("Attachment is empty: {0}")]
    Empty(String),
}

/// An ephemeral, locally renderable reference to a pending attachment.
///
/// Deliberately neither `Clone` nor `Copy`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PreviewHandle(String);

impl PreviewHandle {
    /// Wrap a store-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The handle as a URL-like string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Issues and releases preview handles.
pub trait PreviewStore: Send + Sync {
    /// Create a preview handle for a file.
    fn create(&self, file: &AttachmentFile) -> PreviewHandle;

    /// Release a handle previously returned by [`PreviewStore::create`].
    fn release(&self, handle: PreviewHandle) -> Result<(), PreviewError>;
}

/// Errors from a preview store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreviewError {
    /// The handle was never issued by this store, or was already released.
    #[error("unknown preview handle: {0}")]
    UnknownHandle(String),
}

/// In-memory preview store issuing `preview://<uuid>` handles.
///
/// Tracks live handles so leaks and double releases are observable.
#[derive(Debug, Default)]
pub struct MemoryPreviewStore {
    live: Mutex<HashSet<String>>,
    released: AtomicUsize,
}

impl MemoryPreviewStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles currently outstanding.
    pub fn live_count(&self) -> usize {
        self.live.lock().map_or(0, |live| live.len())
    }

    /// Whether a handle id is still outstanding.
    pub fn is_live(&self, id: &str) -> bool {
        self.live.lock().is_ok_and(|live| live.contains(id))
    }

    /// Total handles successfully released.
    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl PreviewStore for MemoryPreviewStore {
    fn create(&self, _file: &AttachmentFile) -> PreviewHandle {
        let id = format!("preview://{}", Uuid::new_v4());
        if let Ok(mut live) = self.live.lock() {
            live.insert(id.clone());
        }
        PreviewHandle(id)
    }

    fn release(&self, handle: PreviewHandle) -> Result<(), PreviewError> {
        let removed = self
            .live
            .lock()
            .map(|mut live| live.remove(&handle.0))
            .unwrap_or(false);
        if removed {
            self.released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        } else {
            Err(PreviewError::UnknownHandle(handle.0))
        }
    }
}

/// A user-selected image staged for sending.
#[derive(Debug)]
pub struct PendingAttachment {
    /// Preview handle owned by this attachment.
    pub preview: PreviewHandle,
    /// The file itself.
    pub file: AttachmentFile,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AttachmentFile {
        AttachmentFile::new("leaf.png", "image/png", vec![1, 2, 3])
    }

    #[test]
    fn test_data_url() {
        assert_eq!(sample().to_data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn test_from_path_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let file = AttachmentFile::from_path(&path).unwrap();
        assert_eq!(file.name, "leaf.jpg");
        assert_eq!(file.mime, "image/jpeg");
        assert_eq!(file.len(), 3);
    }

    #[test]
    fn test_from_path_rejects_empty_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        std::fs::write(&path, []).unwrap();

        assert!(matches!(
            AttachmentFile::from_path(&path),
            Err(AttachmentError::Empty(_))
        ));
        assert!(matches!(
            AttachmentFile::from_path(&dir.path().join("missing.png")),
            Err(AttachmentError::Io(_))
        ));
    }

    #[test]
    fn test_store_tracks_live_handles() {
        let store = MemoryPreviewStore::new();
        let a = store.create(&sample());
        let b = store.create(&sample());
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("preview://"));
        assert_eq!(store.live_count(), 2);

        store.release(a).unwrap();
        assert_eq!(store.live_count(), 1);
        assert_eq!(store.released_count(), 1);
        assert!(store.is_live(b.as_str()));
    }

    #[test]
    fn test_store_rejects_foreign_handle() {
        let store = MemoryPreviewStore::new();
        let err = store.release(PreviewHandle::new("preview://nope")).unwrap_err();
        assert_eq!(err, PreviewError::UnknownHandle("preview://nope".into()));
        assert_eq!(store.released_count(), 0);
    }
}
