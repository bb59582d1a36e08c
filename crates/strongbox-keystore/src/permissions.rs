//! Owner-only, read-only permission handling for the entropy pool.
//!
//! Two strategies exist:
//! - [`PosixOwnerRead`]: mode bits must be exactly `0400` (`-r--------`)
//! - [`ReadOnlyAttribute`]: the platform read-only flag must be set; where
//!   mode bits exist, group and other must also have no access
//!
//! The strategy is picked at runtime by [`select`], against the directory
//! that will hold the pool. `Auto` takes POSIX mode bits when that
//! filesystem actually honours them and falls back to the read-only flag
//! otherwise. Any other permission profile on an existing pool is a
//! security violation.

use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::KeyStoreError;

/// Owner read, nothing else.
pub const OWNER_READ_MODE: u32 = 0o400;

/// Which permission strategy to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionModel {
    /// POSIX mode bits when the filesystem supports them, otherwise the
    /// read-only flag.
    #[default]
    Auto,
    /// Require POSIX mode `0400`.
    Posix,
    /// Require the read-only flag.
    ReadOnlyAttribute,
}

/// Sets and checks the permission profile of a pool file.
pub trait PermissionPolicy: Send + Sync + std::fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Restrict `path` to this policy's profile.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if permissions cannot be changed.
    fn lock_down(&self, path: &Path) -> io::Result<()>;

    /// Whether `meta` already carries exactly this policy's profile.
    fn is_locked_down(&self, meta: &Metadata) -> bool;
}

/// Mode bits `0400`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixOwnerRead;

impl PosixOwnerRead {
    /// Whether the filesystem holding `dir` stores POSIX mode bits.
    ///
    /// Creates a scratch file in `dir`, sets it to `0400` and reads the
    /// mode back. Filesystems that ignore `chmod` (vfat, some network
    /// mounts) report something else. Always `false` off Unix.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the scratch file cannot be created.
    pub fn is_supported_in(dir: &Path) -> io::Result<bool> {
        #[cfg(unix)]
        {
            let scratch = tempfile::NamedTempFile::new_in(dir)?;
            let policy = Self;
            if policy.lock_down(scratch.path()).is_err() {
                return Ok(false);
            }
            Ok(policy.is_locked_down(&scratch.as_file().metadata()?))
        }
        #[cfg(not(unix))]
        {
            let _ = dir;
            Ok(false)
        }
    }
}

#[cfg(unix)]
impl PermissionPolicy for PosixOwnerRead {
    fn name(&self) -> &'static str {
        "posix-0400"
    }

    fn lock_down(&self, path: &Path) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(OWNER_READ_MODE))
    }

    fn is_locked_down(&self, meta: &Metadata) -> bool {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o777 == OWNER_READ_MODE
    }
}

#[cfg(not(unix))]
impl PermissionPolicy for PosixOwnerRead {
    fn name(&self) -> &'static str {
        "posix-0400"
    }

    fn lock_down(&self, _path: &Path) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "POSIX permissions are not available on this platform",
        ))
    }

    fn is_locked_down(&self, _meta: &Metadata) -> bool {
        false
    }
}

/// Platform read-only flag (DOS attribute on Windows). On Unix this also
/// clears every group and other bit, so the flag never admits a
/// world-readable pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnlyAttribute;

#[cfg(unix)]
impl PermissionPolicy for ReadOnlyAttribute {
    fn name(&self) -> &'static str {
        "read-only-attribute"
    }

    fn lock_down(&self, path: &Path) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(path)?.permissions().mode();
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o500))
    }

    fn is_locked_down(&self, meta: &Metadata) -> bool {
        use std::os::unix::fs::PermissionsExt;
        let mode = meta.permissions().mode();
        meta.permissions().readonly() && mode & 0o077 == 0
    }
}

#[cfg(not(unix))]
impl PermissionPolicy for ReadOnlyAttribute {
    fn name(&self) -> &'static str {
        "read-only-attribute"
    }

    fn lock_down(&self, path: &Path) -> io::Result<()> {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_readonly(true);
        fs::set_permissions(path, perms)
    }

    fn is_locked_down(&self, meta: &Metadata) -> bool {
        meta.permissions().readonly()
    }
}

/// Resolve `model` to a concrete policy for the filesystem holding `dir`.
///
/// # Errors
///
/// Returns [`KeyStoreError::InvalidArgument`] if `Posix` is requested where
/// mode bits are not honoured, and [`KeyStoreError::Io`] if `dir` cannot be
/// checked.
pub fn select(model: PermissionModel, dir: &Path) -> Result<Box<dyn PermissionPolicy>, KeyStoreError> {
    let posix_capable = || {
        PosixOwnerRead::is_supported_in(dir).map_err(|e| {
            KeyStoreError::io(format!("checking permission support in {}", dir.display()), e)
        })
    };

    let policy: Box<dyn PermissionPolicy> = match model {
        PermissionModel::ReadOnlyAttribute => Box::new(ReadOnlyAttribute),
        PermissionModel::Auto if posix_capable()? => Box::new(PosixOwnerRead),
        PermissionModel::Auto => Box::new(ReadOnlyAttribute),
        PermissionModel::Posix if posix_capable()? => Box::new(PosixOwnerRead),
        PermissionModel::Posix => {
            return Err(KeyStoreError::InvalidArgument(format!(
                "POSIX permission model requested but {} does not honour mode bits",
                dir.display()
            )))
        }
    };
    tracing::debug!(dir = %dir.display(), policy = policy.name(), "selected pool permission policy");
    Ok(policy)
}
