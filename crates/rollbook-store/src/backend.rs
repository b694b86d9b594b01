//! Overlay persistence backends.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rollbook_store::JsonFileBackend;
//!
//! let backend = JsonFileBackend::new("/home/me/.config/rollbook/overlay.json");
//! let overlay = backend.load()?.unwrap_or_default();
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use rollbook_core::{Error, OverlayBackend, OverlayDocument, Result};
use rollbook_core::logging::ERROR_MSG;

/// Overlay stored as a single pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OverlayBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<OverlayDocument>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "overlay_store: no overlay file yet");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        let overlay: OverlayDocument = serde_json::from_str(&content)?;
        Ok(Some(overlay))
    }

    fn save(&self, overlay: &OverlayDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(overlay)?;
        debug!(path = %self.path.display(), size = json.len(), "overlay_store: write");

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                warn!(
                    parent = %parent.display(),
                    { ERROR_MSG } = %e,
                    "overlay_store: create_dir_all failed"
                );
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| {
            warn!(
                temp_path = %temp_path.display(),
                { ERROR_MSG } = %e,
                "overlay_store: File::create failed"
            );
            e
        })?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| {
            warn!(
                from = %temp_path.display(),
                to = %self.path.display(),
                { ERROR_MSG } = %e,
                "overlay_store: rename failed"
            );
            e
        })?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Overlay kept in memory; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    document: Mutex<Option<OverlayDocument>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already-persisted overlay.
    pub fn with_document(overlay: OverlayDocument) -> Self {
        Self {
            document: Mutex::new(Some(overlay)),
        }
    }

    /// The last saved overlay, if any.
    pub fn saved(&self) -> Option<OverlayDocument> {
        self.document.lock().ok().and_then(|doc| doc.clone())
    }
}

impl OverlayBackend for MemoryBackend {
    fn load(&self) -> Result<Option<OverlayDocument>> {
        let doc = self
            .document
            .lock()
            .map_err(|_| Error::Storage("memory overlay lock poisoned".to_string()))?;
        Ok(doc.clone())
    }

    fn save(&self, overlay: &OverlayDocument) -> Result<()> {
        let mut doc = self
            .document
            .lock()
            .map_err(|_| Error::Storage("memory overlay lock poisoned".to_string()))?;
        *doc = Some(overlay.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollbook_core::Tag;

    fn overlay_with_tag() -> OverlayDocument {
        OverlayDocument {
            tags: vec![Tag {
                id: "custom-comp-abc123".into(),
                name: "Comp".into(),
                slug: "comp".into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("overlay.json"));
        assert!(backend.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("overlay.json");
        let backend = JsonFileBackend::new(&path);

        backend.save(&overlay_with_tag()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = backend.load().unwrap().unwrap();
        assert_eq!(loaded, overlay_with_tag());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.json");
        std::fs::write(&path, "{ not json").unwrap();
        let backend = JsonFileBackend::new(&path);
        assert!(matches!(backend.load(), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_blank_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.json");
        std::fs::write(&path, "  \n").unwrap();
        assert!(JsonFileBackend::new(&path).load().unwrap().is_none());
    }

    #[test]
    fn test_memory_backend() {
        let backend = MemoryBackend::new();
        assert!(backend.load().unwrap().is_none());
        backend.save(&overlay_with_tag()).unwrap();
        assert_eq!(backend.saved(), Some(overlay_with_tag()));
        assert_eq!(backend.describe(), "memory");
    }
}
