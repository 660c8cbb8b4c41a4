//! Persistence backends.
//!
//! A backend stores the whole document and hands it back. Writes carry the
//! revision the new document was computed from, so a backend that has moved
//! on since can refuse the write instead of silently losing the other change.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::types::Store;

/// Opaque version token of a persisted document.
///
/// An empty revision means "unknown"; writes based on it are unconditional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision(Option<String>);

impl Revision {
    /// The unknown revision.
    pub fn unknown() -> Self {
        Self(None)
    }

    /// A known revision token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    fn counter(value: u64) -> Self {
        Self::new(value.to_string())
    }

    /// The token, if known.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Whether a write based on `self` may overwrite a document at `current`.
    pub fn admits(&self, current: &Revision) -> bool {
        match (&self.0, &current.0) {
            (Some(base), Some(current)) => base == current,
            _ => true,
        }
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str().unwrap_or("unknown"))
    }
}

/// A document together with the revision it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub store: Store,
    pub revision: Revision,
}

/// The JSON envelope the store API reads and writes: `{"store": {...}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub store: Store,
}

/// Somewhere the whole store can be read from and written to.
pub trait Backend {
    /// Read the current document.
    fn fetch(&self) -> Result<Snapshot>;

    /// Overwrite the document, provided it is still at `base`.
    ///
    /// Returns the revision of the written document.
    fn replace(&self, store: &Store, base: &Revision) -> Result<Revision>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn fetch(&self) -> Result<Snapshot> {
        (**self).fetch()
    }

    fn replace(&self, store: &Store, base: &Revision) -> Result<Revision> {
        (**self).replace(store, base)
    }
}

fn check_revision(base: &Revision, current: &Revision) -> Result<()> {
    if base.admits(current) {
        Ok(())
    } else {
        Err(Error::Conflict {
            expected: base.to_string(),
            found: current.to_string(),
        })
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    store: Store,
    version: u64,
    fail_writes: bool,
}

/// In-process backend, used by tests and offline sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend already holding `store`.
    pub fn with_store(store: Store) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                store,
                ..MemoryState::default()
            }),
        }
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Copy of the stored document.
    pub fn stored(&self) -> Store {
        self.lock().store.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Backend for MemoryBackend {
    fn fetch(&self) -> Result<Snapshot> {
        let state = self.lock();
        Ok(Snapshot {
            store: state.store.clone(),
            revision: Revision::counter(state.version),
        })
    }

    fn replace(&self, store: &Store, base: &Revision) -> Result<Revision> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(Error::Backend("write rejected".to_string()));
        }
        check_revision(base, &Revision::counter(state.version))?;

        state.store = store.clone();
        state.version += 1;
        Ok(Revision::counter(state.version))
    }
}

/// On-disk form of the file backend: the API envelope plus a write counter.
#[derive(Debug, Default, Serialize, Deserialize)]
struct FileDocument {
    #[serde(default)]
    store: Store,
    #[serde(default)]
    revision: u64,
}

/// Backend keeping the document in a local JSON file.
///
/// A missing file reads as an empty store. Writes go to a sibling temporary
/// file that is then renamed over the original.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Use the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<FileDocument> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(FileDocument::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{} does not exist yet; starting empty", self.path.display());
                Ok(FileDocument::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "store.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Backend for FileBackend {
    fn fetch(&self) -> Result<Snapshot> {
        let document = self.read()?;
        Ok(Snapshot {
            store: document.store,
            revision: Revision::counter(document.revision),
        })
    }

    fn replace(&self, store: &Store, base: &Revision) -> Result<Revision> {
        let current = self.read()?;
        check_revision(base, &Revision::counter(current.revision))?;

        let document = FileDocument {
            store: store.clone(),
            revision: current.revision + 1,
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let temp = self.temp_path();
        fs::write(&temp, serde_json::to_vec_pretty(&document)?)?;
        fs::rename(&temp, &self.path)?;

        log::debug!(
            "Wrote {} presentations to {} (revision {})",
            store.len(),
            self.path.display(),
            document.revision
        );
        Ok(Revision::counter(document.revision))
    }
}
