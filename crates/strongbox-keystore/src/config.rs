//! Master-key configuration.
//!
//! Stored as camelCase JSON so it can sit next to the rest of a host
//! application's settings:
//!
//! ```json
//! { "entropyFile": "/var/lib/app/keyfile", "keyBits": 256 }
//! ```
//!
//! Omitted fields take the defaults below. Unlike ordinary preferences, an
//! unreadable or malformed file is an error, never a silent default.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strongbox_crypto_core::{validate_key_bits, DEFAULT_KEY_BITS, SHA256_LEN};

use crate::error::KeyStoreError;
use crate::permissions::PermissionModel;

/// Default entropy pool size in bytes.
pub const DEFAULT_ENTROPY_BYTES: usize = 256;

/// Smallest entropy pool accepted.
pub const MIN_ENTROPY_BYTES: usize = 32;

/// Default stored digest size in bytes (full SHA-256).
pub const DEFAULT_DIGEST_BYTES: usize = SHA256_LEN;

// ── Config ─────────────────────────────────────────────────────────

/// Where the entropy pool lives and how the KEK is cut from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyStoreConfig {
    /// Path of the entropy pool file. Its parent directory must exist.
    pub entropy_file: PathBuf,

    /// KEK size in bits: a multiple of 8, at most 256.
    #[serde(default = "default_key_bits")]
    pub key_bits: u32,

    /// Random bytes in the pool. At least [`MIN_ENTROPY_BYTES`].
    #[serde(default = "default_entropy_bytes")]
    pub entropy_bytes: usize,

    /// Leading SHA-256 bytes stored as the pool integrity digest (1–32).
    #[serde(default = "default_digest_bytes")]
    pub digest_bytes: usize,

    /// How pool file permissions are set and checked.
    #[serde(default)]
    pub permission_model: PermissionModel,
}

const fn default_key_bits() -> u32 {
    DEFAULT_KEY_BITS
}
const fn default_entropy_bytes() -> usize {
    DEFAULT_ENTROPY_BYTES
}
const fn default_digest_bytes() -> usize {
    DEFAULT_DIGEST_BYTES
}

impl KeyStoreConfig {
    /// Defaults for everything but the pool path.
    #[must_use]
    pub fn new(entropy_file: impl Into<PathBuf>) -> Self {
        Self {
            entropy_file: entropy_file.into(),
            key_bits: DEFAULT_KEY_BITS,
            entropy_bytes: DEFAULT_ENTROPY_BYTES,
            digest_bytes: DEFAULT_DIGEST_BYTES,
            permission_model: PermissionModel::default(),
        }
    }

    #[must_use]
    pub const fn with_key_bits(mut self, key_bits: u32) -> Self {
        self.key_bits = key_bits;
        self
    }

    #[must_use]
    pub const fn with_entropy_bytes(mut self, entropy_bytes: usize) -> Self {
        self.entropy_bytes = entropy_bytes;
        self
    }

    #[must_use]
    pub const fn with_digest_bytes(mut self, digest_bytes: usize) -> Self {
        self.digest_bytes = digest_bytes;
        self
    }

    #[must_use]
    pub const fn with_permission_model(mut self, model: PermissionModel) -> Self {
        self.permission_model = model;
        self
    }

    /// Reject unusable values before anything touches the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::InvalidArgument`] for an empty path, a bad
    /// key size, a pool smaller than [`MIN_ENTROPY_BYTES`], or a digest
    /// size outside 1–32.
    pub fn validate(&self) -> Result<(), KeyStoreError> {
        if self.entropy_file.as_os_str().is_empty() {
            return Err(KeyStoreError::InvalidArgument(
                "entropy file path is empty".into(),
            ));
        }
        validate_key_bits(self.key_bits)
            .map_err(|e| KeyStoreError::InvalidArgument(format!("keyBits: {e}")))?;
        validate_pool_sizes(self.entropy_bytes, self.digest_bytes)
    }

    /// Expected pool file size: hex doubles the byte count.
    #[must_use]
    pub const fn pool_file_len(&self) -> usize {
        self.entropy_bytes
            .saturating_add(self.digest_bytes)
            .saturating_mul(2)
    }

    // ── File I/O ───────────────────────────────────────────────────

    /// Load and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Config`] if the file cannot be read or
    /// parsed, or [`KeyStoreError::InvalidArgument`] if it fails
    /// [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self, KeyStoreError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| KeyStoreError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| KeyStoreError::Config(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Persist as pretty JSON, atomically, owner-only on Unix.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Io`] if the write or rename fails.
    pub fn save(&self, path: &Path) -> Result<(), KeyStoreError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| KeyStoreError::Config(format!("cannot serialize config: {e}")))?;
        write_private_atomic(path, json.as_bytes())
    }
}

/// Check entropy pool sizes: at least [`MIN_ENTROPY_BYTES`] of entropy and
/// a digest of 1 to 32 bytes.
///
/// # Errors
///
/// Returns [`KeyStoreError::InvalidArgument`] if either size is out of range.
pub fn validate_pool_sizes(entropy_bytes: usize, digest_bytes: usize) -> Result<(), KeyStoreError> {
    if entropy_bytes < MIN_ENTROPY_BYTES {
        return Err(KeyStoreError::InvalidArgument(format!(
            "entropyBytes must be at least {MIN_ENTROPY_BYTES}, got {entropy_bytes}"
        )));
    }
    if !(1..=SHA256_LEN).contains(&digest_bytes) {
        return Err(KeyStoreError::InvalidArgument(format!(
            "digestBytes must be between 1 and {SHA256_LEN}, got {digest_bytes}"
        )));
    }
    Ok(())
}

/// Directory a new file at `path` will be created in.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Write `bytes` to a temp file beside `path`, restrict it to the owner,
/// then rename it over `path`.
pub(crate) fn write_private_atomic(path: &Path, bytes: &[u8]) -> Result<(), KeyStoreError> {
    let mut tmp = tempfile::NamedTempFile::new_in(parent_dir(path))
        .map_err(|e| KeyStoreError::io(format!("creating temp file for {}", path.display()), e))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| KeyStoreError::io(format!("writing {}", path.display()), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))
            .map_err(|e| KeyStoreError::io(format!("restricting {}", path.display()), e))?;
    }

    tmp.persist(path)
        .map_err(|e| KeyStoreError::io(format!("replacing {}", path.display()), e.error))?;
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────
