//! Persistent storage for the session token.
//!
//! Every backend holds at most one value, the bearer token, under the key
//! `token`. Reads never fail on a missing value; they return `None`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Keychain service name
const SERVICE_NAME: &str = "movierank";

/// Key the session token is stored under
pub const TOKEN_KEY: &str = "token";

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse session file: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session store lock poisoned")]
    Poisoned,
}

/// Key-value adapter holding the session token.
pub trait TokenStore: Send + Sync {
    /// Read the persisted token, `None` when absent
    fn get(&self) -> Result<Option<String>, StorageError>;

    /// Persist the token, overwriting any previous value
    fn set(&self, token: &str) -> Result<(), StorageError>;

    /// Remove the token; clearing an empty store succeeds
    fn clear(&self) -> Result<(), StorageError>;
}

// ============================================================================
// Keychain
// ============================================================================

/// Stores the token in the OS keychain.
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<Entry, StorageError> {
        Ok(Entry::new(&self.service, TOKEN_KEY)?)
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Result<Option<String>, StorageError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        self.entry()?.set_password(token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Session file
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub token: String,
    pub stored_at: DateTime<Utc>,
}

/// Stores the token as JSON in the cache directory, for hosts without a keychain.
pub struct FileTokenStore {
    cache_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    /// Load the full session record, including when it was written
    pub fn load(&self) -> Result<Option<SessionFile>, StorageError> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.map(|session| session.token))
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let session = SessionFile {
            token: token.to_string(),
            stored_at: Utc::now(),
        };
        write_private(&path, &serde_json::to_string_pretty(&session)?)?;
        debug!(path = %path.display(), "Session token written");
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Write a file only the owner can read, tightening an existing one
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>, StorageError> {
        Ok(self.token.lock().map_err(|_| StorageError::Poisoned)?.clone())
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        *self.token.lock().map_err(|_| StorageError::Poisoned)? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.token.lock().map_err(|_| StorageError::Poisoned)? = None;
        Ok(())
    }
}
