//! Platform-protected credential store backends.

use crate::error::{WalletError, WalletResult};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zeroize::Zeroize;

/// When an entry may be read, mirroring mobile keychain classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    /// Only while the device is unlocked, never migrated to another device
    WhenUnlockedThisDeviceOnly,
    Always,
}

/// Key-value secret storage keyed by namespace.
///
/// Implementations must make `set_secret` overwrite atomically from the
/// reader's point of view and treat resetting a missing entry as success.
pub trait CredentialStore: Send + Sync {
    fn set_secret(&self, namespace: &str, value: &str, accessibility: Accessibility) -> WalletResult<()>;

    fn get_secret(&self, namespace: &str) -> WalletResult<Option<String>>;

    fn reset_secret(&self, namespace: &str) -> WalletResult<()>;
}

/// In-process store; contents are wiped when entries are replaced or dropped.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: DashMap<String, StoredEntry>,
}

impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCredentialStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn set_secret(&self, namespace: &str, value: &str, accessibility: Accessibility) -> WalletResult<()> {
        let entry = StoredEntry {
            accessibility,
            value: value.to_string(),
        };
        if let Some(mut previous) = self.entries.insert(namespace.to_string(), entry) {
            previous.value.zeroize();
        }
        Ok(())
    }

    fn get_secret(&self, namespace: &str) -> WalletResult<Option<String>> {
        Ok(self.entries.get(namespace).map(|e| e.value.clone()))
    }

    fn reset_secret(&self, namespace: &str) -> WalletResult<()> {
        if let Some((_, mut removed)) = self.entries.remove(namespace) {
            removed.value.zeroize();
        }
        Ok(())
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct StoredEntry {
    accessibility: Accessibility,
    value: String,
}

impl Drop for StoredEntry {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

/// One file per entry under a private directory.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    /// Store under `<config dir>/cresca`.
    pub fn new() -> WalletResult<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| WalletError::storage("could not find config directory"))?
            .join("cresca");
        Self::at(dir)
    }

    pub fn at(dir: impl Into<PathBuf>) -> WalletResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| WalletError::storage(format!("cannot create {}: {}", dir.display(), e)))?;
        restrict_permissions(&dir, 0o700);
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, namespace: &str) -> WalletResult<PathBuf> {
        let valid = !namespace.is_empty()
            && namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !namespace.starts_with('.');
        if !valid {
            return Err(WalletError::storage(format!("invalid entry name: {}", namespace)));
        }
        Ok(self.dir.join(format!("{}.cred", namespace)))
    }
}

impl CredentialStore for FileCredentialStore {
    fn set_secret(&self, namespace: &str, value: &str, accessibility: Accessibility) -> WalletResult<()> {
        let path = self.entry_path(namespace)?;
        let entry = StoredEntry {
            accessibility,
            value: value.to_string(),
        };
        let mut data = serde_json::to_string(&entry)?;

        // Write then rename so readers never observe a torn entry
        let tmp = path.with_extension("cred.tmp");
        let written = write_private(&tmp, data.as_bytes());
        data.zeroize();
        written.map_err(|e| WalletError::storage(format!("cannot write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path)
            .map_err(|e| WalletError::storage(format!("cannot replace {}: {}", path.display(), e)))?;

        debug!(entry = namespace, "Stored credential");
        Ok(())
    }

    fn get_secret(&self, namespace: &str) -> WalletResult<Option<String>> {
        let path = self.entry_path(namespace)?;
        let mut data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(WalletError::storage(format!("cannot read {}: {}", path.display(), e)));
            }
        };
        let parsed = serde_json::from_str::<StoredEntry>(&data);
        data.zeroize();
        let entry = parsed.map_err(|e| {
            warn!(entry = namespace, "Credential entry is corrupted");
            WalletError::storage(format!("corrupted entry {}: {}", namespace, e))
        })?;
        Ok(Some(entry.value.clone()))
    }

    fn reset_secret(&self, namespace: &str) -> WalletResult<()> {
        let path = self.entry_path(namespace)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WalletError::storage(format!("cannot remove {}: {}", path.display(), e))),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
        warn!(path = %path.display(), error = %e, "Failed to restrict permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _mode: u32) {}

/// Create `path` readable by the owner only and write `data` to it.
///
/// A leftover file from an interrupted write is removed first, since the
/// mode only applies to newly created files.
fn write_private(path: &Path, data: &[u8]) -> io::Result<()> {
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
    file.write_all(data)?;
    file.sync_all()
}

/// Operating-system keychain (macOS Keychain, Secret Service, Windows
/// Credential Manager).
#[cfg(feature = "keychain")]
pub struct KeychainCredentialStore {
    service: String,
}

#[cfg(feature = "keychain")]
impl KeychainCredentialStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, namespace: &str) -> WalletResult<keyring::Entry> {
        keyring::Entry::new(&self.service, namespace)
            .map_err(|e| WalletError::storage(format!("keychain unavailable: {}", e)))
    }
}

#[cfg(feature = "keychain")]
impl CredentialStore for KeychainCredentialStore {
    // The OS enforces its own access policy; the accessibility hint is advisory here.
    fn set_secret(&self, namespace: &str, value: &str, _accessibility: Accessibility) -> WalletResult<()> {
        self.entry(namespace)?
            .set_password(value)
            .map_err(|e| WalletError::storage(format!("keychain write failed: {}", e)))
    }

    fn get_secret(&self, namespace: &str) -> WalletResult<Option<String>> {
        match self.entry(namespace)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(WalletError::storage(format!("keychain read failed: {}", e))),
        }
    }

    fn reset_secret(&self, namespace: &str) -> WalletResult<()> {
        match self.entry(namespace)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(WalletError::storage(format!("keychain delete failed: {}", e))),
        }
    }
}
