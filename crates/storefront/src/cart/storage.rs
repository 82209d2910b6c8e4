//! File-backed persistence for the cart ledger.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::CartLine;

/// File name of the persisted cart inside the data directory.
pub const STORAGE_FILE: &str = "cart-storage.json";

/// Errors that can occur reading or writing the persisted cart.
#[derive(Debug, thiserror::Error)]
pub enum CartStorageError {
    /// Reading or writing the file failed.
    #[error("cart storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file exists but does not hold a valid cart payload.
    #[error("cart storage payload is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Durable storage for the cart ledger.
///
/// The ledger is persisted as a plain JSON array of cart lines
/// (`[{id, name, price, image, quantity}, ...]`) under a fixed file name,
/// so the payload stays readable and hand-editable.
#[derive(Debug, Clone)]
pub struct CartStorage {
    path: PathBuf,
}

impl CartStorage {
    /// Storage rooted at the given data directory.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join(STORAGE_FILE),
        }
    }

    /// Path of the persisted payload.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted lines.
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<Vec<CartLine>>, CartStorageError> {
        let payload = match fs::read_to_string(&self.path) {
            Ok(payload) => payload,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let lines = serde_json::from_str(&payload)?;
        Ok(Some(lines))
    }

    /// Write the full ledger snapshot.
    ///
    /// The payload goes to a temporary sibling first and is renamed into
    /// place, so a crash mid-write cannot leave a truncated cart behind.
    ///
    /// # Errors
    ///
    /// Returns an error when the data directory cannot be created or the
    /// write fails.
    pub fn save(&self, lines: &[CartLine]) -> Result<(), CartStorageError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let payload = serde_json::to_string_pretty(lines)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), lines = lines.len(), "persisted cart");
        Ok(())
    }
}
