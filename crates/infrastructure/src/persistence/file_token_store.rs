//! File-based token store.
//!
//! Both slots live in one JSON object:
//! ```json
//! {
//!   "__memorizerAccess": "eyJ...",
//!   "__memorizerRefresh": "eyJ..."
//! }
//! ```
//! Writes go to a sibling temp file that is renamed over the target, so a
//! reader sees either the old pair or the new one.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use memorizer_application::ports::{StorageError, TokenStore};
use memorizer_domain::{ACCESS_TOKEN_SLOT, REFRESH_TOKEN_SLOT, StoredTokens, TokenPair};
use tracing::{debug, warn};

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

type Slots = BTreeMap<String, String>;

/// [`TokenStore`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store at `path`. Nothing is touched until the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `<config_dir>/memorizer/tokens.json`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoStorageDir`] if the platform has no config
    /// directory.
    pub fn default_path() -> Result<PathBuf, StorageError> {
        dirs::config_dir()
            .map(|dir| dir.join("memorizer").join("tokens.json"))
            .ok_or(StorageError::NoStorageDir)
    }

    /// Creates a store at [`default_path`](Self::default_path).
    ///
    /// # Errors
    ///
    /// Same as [`default_path`](Self::default_path).
    pub fn at_default_location() -> Result<Self, StorageError> {
        Self::default_path().map(Self::new)
    }

    /// File backing this store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_slots(&self) -> Result<Slots, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Slots::new()),
            Err(e) => return Err(e.into()),
        };
        match from_json_bytes(&bytes) {
            Ok(slots) => Ok(slots),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable token file");
                Ok(Slots::new())
            }
        }
    }

    fn write_slots(&self, slots: &Slots) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes =
            to_json_stable_bytes(slots).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let temp = self.temp_path();
        let written = write_private(&temp, &bytes).and_then(|()| fs::rename(&temp, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Writes `bytes` to a freshly created file that is owner read/write only
/// on Unix from the moment it exists.
fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    // A leftover from an interrupted write may carry other permissions.
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

impl TokenStore for FileTokenStore {
    fn save(&self, tokens: &TokenPair) -> Result<(), StorageError> {
        let mut slots = Slots::new();
        slots.insert(ACCESS_TOKEN_SLOT.to_string(), tokens.access_token.clone());
        slots.insert(REFRESH_TOKEN_SLOT.to_string(), tokens.refresh_token.clone());
        self.write_slots(&slots)?;
        debug!(path = %self.path.display(), "tokens saved");
        Ok(())
    }

    fn load(&self) -> Result<StoredTokens, StorageError> {
        let mut slots = self.read_slots()?;
        Ok(StoredTokens {
            access_token: slots.remove(ACCESS_TOKEN_SLOT),
            refresh_token: slots.remove(REFRESH_TOKEN_SLOT),
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "tokens cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
