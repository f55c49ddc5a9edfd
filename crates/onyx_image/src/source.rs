//! Art sources
//!
//! Album art is retrieved through an [`ArtSource`]. Fetching blocks, so
//! callers run it inside an async actor's work body, never on the render
//! thread.

use crate::error::{ImageError, Result};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Blocking provider of encoded art bytes, keyed by album id
pub trait ArtSource: Send + Sync {
    fn fetch_art(&self, id: &str) -> Result<Vec<u8>>;
}

/// In-memory art store
#[derive(Debug, Default)]
pub struct MemoryArtSource {
    entries: RwLock<FxHashMap<String, Vec<u8>>>,
}

impl MemoryArtSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(self, id: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(id, bytes);
        self
    }

    pub fn insert(&self, id: impl Into<String>, bytes: Vec<u8>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(id.into(), bytes);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtSource for MemoryArtSource {
    fn fetch_art(&self, id: &str) -> Result<Vec<u8>> {
        let entries = self.entries.read().map_err(|_| ImageError::Fetch {
            id: id.to_string(),
            reason: "art store poisoned".to_string(),
        })?;
        entries.get(id).cloned().ok_or_else(|| ImageError::Fetch {
            id: id.to_string(),
            reason: "no art for album".to_string(),
        })
    }
}

/// Art stored as `<id>.<ext>` files in one directory
#[derive(Debug, Clone)]
pub struct DirectoryArtSource {
    root: PathBuf,
}

impl DirectoryArtSource {
    /// Extensions tried in order
    pub const EXTENSIONS: [&'static str; 3] = ["jpg", "jpeg", "png"];

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, id: &str) -> impl Iterator<Item = PathBuf> + '_ {
        let id = id.to_string();
        Self::EXTENSIONS
            .iter()
            .map(move |ext| self.root.join(format!("{}.{}", id, ext)))
    }
}

impl ArtSource for DirectoryArtSource {
    fn fetch_art(&self, id: &str) -> Result<Vec<u8>> {
        // Ids come from album metadata; keep them inside the root
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(ImageError::Fetch {
                id: id.to_string(),
                reason: "invalid art id".to_string(),
            });
        }

        for path in self.candidates(id) {
            if path.is_file() {
                tracing::debug!("DirectoryArtSource: reading {}", path.display());
                return Ok(std::fs::read(&path)?);
            }
        }
        Err(ImageError::Fetch {
            id: id.to_string(),
            reason: format!("not found in {}", self.root.display()),
        })
    }
}
