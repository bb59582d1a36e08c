//! The on-disk entropy pool.
//!
//! One file, created once, never rewritten:
//!
//! ```text
//! HEX_UPPER( entropy (entropy_bytes) || SHA-256(salt || entropy)[..digest_bytes] )
//! ```
//!
//! The file must be a regular file with an owner-only, read-only profile
//! (see [`crate::permissions`]). Reading it checks type, permissions, size
//! and digest; any failure is a [`KeyStoreError::Security`] and is never
//! answered by creating a fresh pool, since that would silently replace
//! the root secret.
//!
//! Creation is race-safe across processes: the pool is written to a temp
//! file, locked down, checked, then linked into place only if nothing
//! exists there yet. A process that loses the race reads the winner's pool.
//! A filesystem that silently ignores the lock-down never gets a pool.

use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use data_encoding::{HEXUPPER, HEXUPPER_PERMISSIVE};
use strongbox_crypto_core::{digest_matches, pool_digest, SecretBuffer};
use zeroize::Zeroizing;

use crate::config::{parent_dir, validate_pool_sizes, KeyStoreConfig};
use crate::error::KeyStoreError;
use crate::permissions::{self, PermissionModel, PermissionPolicy};

/// Outcome of looking for a pool file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolProbe {
    /// Nothing at the path; the pool may be created.
    Absent,
    /// A regular file with the required permission profile.
    Present,
}

/// Outcome of [`EntropyPool::ensure_exists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolOrigin {
    /// The pool was already there.
    Existing,
    /// This call created it.
    Created,
    /// Another process created it between our probe and our write.
    LostRace,
}

/// Handle on a pool file. Holds no secret state itself.
///
/// The permission policy is resolved against the pool's directory on
/// first filesystem access, not at construction.
#[derive(Debug)]
pub struct EntropyPool {
    path: PathBuf,
    entropy_bytes: usize,
    digest_bytes: usize,
    model: PermissionModel,
    policy: OnceLock<Box<dyn PermissionPolicy>>,
}

impl EntropyPool {
    /// Pool at `path` whose permission policy is picked from `model` at
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::InvalidArgument`] for an empty path or sizes
    /// rejected by [`validate_pool_sizes`].
    pub fn new(
        path: impl Into<PathBuf>,
        entropy_bytes: usize,
        digest_bytes: usize,
        model: PermissionModel,
    ) -> Result<Self, KeyStoreError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(KeyStoreError::InvalidArgument(
                "entropy file path is empty".into(),
            ));
        }
        validate_pool_sizes(entropy_bytes, digest_bytes)?;
        Ok(Self {
            path,
            entropy_bytes,
            digest_bytes,
            model,
            policy: OnceLock::new(),
        })
    }

    /// Pool at `path` using exactly `policy`.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new).
    pub fn with_policy(
        path: impl Into<PathBuf>,
        entropy_bytes: usize,
        digest_bytes: usize,
        policy: Box<dyn PermissionPolicy>,
    ) -> Result<Self, KeyStoreError> {
        let pool = Self::new(path, entropy_bytes, digest_bytes, PermissionModel::Auto)?;
        let _ = pool.policy.set(policy);
        Ok(pool)
    }

    /// Pool described by a validated configuration. No filesystem access.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::InvalidArgument`] if the configuration is
    /// invalid.
    pub fn from_config(config: &KeyStoreConfig) -> Result<Self, KeyStoreError> {
        config.validate()?;
        Self::new(
            config.entropy_file.clone(),
            config.entropy_bytes,
            config.digest_bytes,
            config.permission_model,
        )
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Expected file size in bytes.
    #[must_use]
    pub const fn file_len(&self) -> usize {
        self.entropy_bytes
            .saturating_add(self.digest_bytes)
            .saturating_mul(2)
    }

    fn policy(&self) -> Result<&dyn PermissionPolicy, KeyStoreError> {
        if let Some(policy) = self.policy.get() {
            return Ok(policy.as_ref());
        }
        let resolved = permissions::select(self.model, parent_dir(&self.path))?;
        Ok(self.policy.get_or_init(|| resolved).as_ref())
    }

    /// Regular file carrying the policy's permission profile.
    fn check_profile(&self, meta: &Metadata) -> Result<(), KeyStoreError> {
        if !meta.file_type().is_file() {
            return Err(self.violation("entropy pool is not a regular file"));
        }
        if !self.policy()?.is_locked_down(meta) {
            return Err(self.violation("entropy pool has invalid permissions"));
        }
        Ok(())
    }

    // ── Probe ──────────────────────────────────────────────────────

    /// Look at the pool path without following symlinks.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Security`] if something exists at the path
    /// but is not a regular file or has the wrong permissions, and
    /// [`KeyStoreError::Io`] if the metadata cannot be read.
    pub fn probe(&self) -> Result<PoolProbe, KeyStoreError> {
        let meta = match fs::symlink_metadata(&self.path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PoolProbe::Absent),
            Err(e) => {
                return Err(KeyStoreError::io(
                    format!("inspecting entropy pool {}", self.path.display()),
                    e,
                ))
            }
        };
        self.check_profile(&meta)?;
        Ok(PoolProbe::Present)
    }

    // ── Create ─────────────────────────────────────────────────────

    /// Create the pool if nothing is at its path yet.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Security`] if an existing pool fails the
    /// probe or the filesystem does not keep the permission profile, and
    /// [`KeyStoreError::Io`] or [`KeyStoreError::Crypto`] if creation fails.
    pub fn ensure_exists(&self) -> Result<PoolOrigin, KeyStoreError> {
        match self.probe()? {
            PoolProbe::Present => Ok(PoolOrigin::Existing),
            PoolProbe::Absent => self.create(),
        }
    }

    fn create(&self) -> Result<PoolOrigin, KeyStoreError> {
        let policy = self.policy()?;
        let entropy = SecretBuffer::random(self.entropy_bytes)?;
        let digest = pool_digest(entropy.expose());

        let mut contents = Zeroizing::new(Vec::with_capacity(
            self.entropy_bytes.saturating_add(self.digest_bytes),
        ));
        contents.extend_from_slice(entropy.expose());
        contents.extend_from_slice(&digest[..self.digest_bytes]);

        let mut hex = Zeroizing::new(vec![0u8; HEXUPPER.encode_len(contents.len())]);
        HEXUPPER.encode_mut(&contents, &mut hex);

        let mut tmp = tempfile::NamedTempFile::new_in(parent_dir(&self.path))
            .map_err(|e| KeyStoreError::io("creating entropy pool temp file", e))?;
        tmp.write_all(&hex)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| KeyStoreError::io("writing entropy pool", e))?;
        policy
            .lock_down(tmp.path())
            .map_err(|e| KeyStoreError::io("setting entropy pool permissions", e))?;

        let applied = tmp
            .as_file()
            .metadata()
            .map_err(|e| KeyStoreError::io("checking entropy pool permissions", e))?;
        if !policy.is_locked_down(&applied) {
            return Err(self.violation(&format!(
                "filesystem did not keep the {} profile on the new entropy pool",
                policy.name()
            )));
        }

        match tmp.persist_noclobber(&self.path) {
            Ok(_) => {
                tracing::info!(
                    path = %self.path.display(),
                    entropy_bytes = self.entropy_bytes,
                    policy = policy.name(),
                    "created entropy pool"
                );
                Ok(PoolOrigin::Created)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                tracing::warn!(
                    path = %self.path.display(),
                    "entropy pool created concurrently by another process; using theirs"
                );
                Ok(PoolOrigin::LostRace)
            }
            Err(e) => Err(KeyStoreError::io(
                format!("installing entropy pool {}", self.path.display()),
                e.error,
            )),
        }
    }

    // ── Read ───────────────────────────────────────────────────────

    /// Read the pool, verify it, and return only the entropy segment.
    ///
    /// The file is opened without following symlinks and every check runs
    /// against the open handle, so the bytes read are the bytes checked.
    /// Every intermediate buffer (raw file, decoded bytes) is wiped on
    /// return, including on error paths.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Security`] if the pool is missing, a
    /// symlink, not a regular file, has the wrong permissions, the wrong
    /// size, is not hex, or fails the digest check.
    pub fn read_verified(&self) -> Result<SecretBuffer, KeyStoreError> {
        let mut file = match open_no_follow(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(self.violation("entropy pool does not exist"))
            }
            Err(e) if is_symlink_refusal(&e) => {
                return Err(self.violation("entropy pool is not a regular file"))
            }
            Err(e) => return Err(KeyStoreError::io("opening entropy pool", e)),
        };

        let meta = file
            .metadata()
            .map_err(|e| KeyStoreError::io("inspecting entropy pool", e))?;
        self.check_profile(&meta)?;

        let expected = self.file_len();
        if usize::try_from(meta.len()).ok() != Some(expected) {
            return Err(self.violation("entropy pool size incorrect"));
        }
        let mut raw = Zeroizing::new(Vec::with_capacity(expected));
        file.read_to_end(&mut raw)
            .map_err(|e| KeyStoreError::io("reading entropy pool", e))?;
        if raw.len() != expected {
            return Err(self.violation("entropy pool size incorrect"));
        }

        let decoded_len = HEXUPPER_PERMISSIVE
            .decode_len(raw.len())
            .map_err(|_| self.violation("entropy pool is not hex encoded"))?;
        let mut decoded = Zeroizing::new(vec![0u8; decoded_len]);
        HEXUPPER_PERMISSIVE
            .decode_mut(&raw, &mut decoded)
            .map_err(|_| self.violation("entropy pool is not hex encoded"))?;

        let (entropy, stored_digest) = decoded.split_at(self.entropy_bytes);
        if !digest_matches(entropy, stored_digest) {
            return Err(self.violation("entropy pool fails integrity check"));
        }

        Ok(SecretBuffer::new(entropy))
    }

    /// Pool creation time in milliseconds since the Unix epoch.
    ///
    /// Falls back to the modification time where the filesystem keeps no
    /// birth time; the pool is never rewritten, so both are stable.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Io`] if the metadata cannot be read.
    pub fn created_millis(&self) -> Result<i64, KeyStoreError> {
        let meta = fs::symlink_metadata(&self.path)
            .map_err(|e| KeyStoreError::io("reading entropy pool timestamp", e))?;
        let stamp = match meta.created() {
            Ok(created) => created,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "no birth time for entropy pool; using modification time"
                );
                meta.modified()
                    .map_err(|e| KeyStoreError::io("reading entropy pool timestamp", e))?
            }
        };
        Ok(system_time_millis(stamp))
    }

    fn violation(&self, what: &str) -> KeyStoreError {
        tracing::error!(path = %self.path.display(), "{what}");
        KeyStoreError::Security(format!("{what}: {}", self.path.display()))
    }
}

fn system_time_millis(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_millis()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_millis())
            .ok()
            .and_then(i64::checked_neg)
            .unwrap_or(i64::MIN),
    }
}

/// Open read-only, refusing a symlink in the final component. FIFOs open
/// without blocking so the regular-file check can reject them.
fn open_no_follow(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NOFOLLOW | libc::O_NONBLOCK);
    }
    options.open(path)
}

#[cfg(unix)]
fn is_symlink_refusal(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::ELOOP)
}

#[cfg(not(unix))]
const fn is_symlink_refusal(_e: &io::Error) -> bool {
    false
}

// ── Tests ──────────────────────────────────────────────────────────
