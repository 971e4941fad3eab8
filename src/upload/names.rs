//! Random file names and the registry of names already in use.

use std::collections::HashSet;
use std::path::Path;

use parking_lot::Mutex;
use rand::Rng;
use tracing::debug;

/// Characters a random file stem is drawn from.
pub const NAME_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Generate a random file stem of `length` characters from [`NAME_ALPHABET`].
pub fn random_stem(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| NAME_ALPHABET[rng.gen_range(0..NAME_ALPHABET.len())] as char)
        .collect()
}

// =============================================================================
// FileNameRegistry
// =============================================================================

/// Thread-safe set of file names that are taken.
///
/// Seeded from the upload directory at startup and updated as uploads are
/// stored. A name is reserved before its file is created, so two concurrent
/// uploads can never pick the same name.
#[derive(Debug, Default)]
pub struct FileNameRegistry {
    names: Mutex<HashSet<String>>,
}

impl FileNameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry containing every entry currently in `dir`.
    pub async fn from_dir(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        let mut names = HashSet::new();

        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }

        debug!(dir = %dir.display(), count = names.len(), "Loaded existing file names");

        Ok(Self {
            names: Mutex::new(names),
        })
    }

    /// Check whether `name` is taken.
    pub fn contains(&self, name: &str) -> bool {
        self.names.lock().contains(name)
    }

    /// Mark `name` as taken. Returns `false` if it already was.
    pub fn reserve(&self, name: &str) -> bool {
        self.names.lock().insert(name.to_string())
    }

    /// Free a reserved name. Returns `false` if it was not taken.
    pub fn release(&self, name: &str) -> bool {
        self.names.lock().remove(name)
    }

    pub fn len(&self) -> usize {
        self.names.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.lock().is_empty()
    }
}
