//! Secure memory for key material and derived secrets.
//!
//! Every secret this crate hands out lives in one of two containers:
//! - [`SecretBuffer`] for raw bytes (KEKs, key material, unwrapped keys)
//! - [`SecretString`] for printable passwords
//!
//! Both are zeroized on drop. `SecretBuffer` additionally tries to `mlock`
//! its pages and never prints its contents through `Debug`/`Display`.
//! Wiping is best effort: the allocator or the OS may still hold copies we
//! cannot reach.

use crate::error::CryptoError;
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretSlice};
use std::fmt;
use zeroize::Zeroizing;

/// Password characters, zeroized on drop.
pub type SecretString = Zeroizing<String>;

// ---------------------------------------------------------------------------
// Page locking
// ---------------------------------------------------------------------------

/// Keeps a heap region `mlock`ed for as long as it lives.
///
/// Failure to lock is not an error: the region simply stays swappable and a
/// single warning is logged for the process.
struct LockedRegion {
    ptr: *const u8,
    len: usize,
    locked: bool,
}

// SAFETY: the pointer is only handed to mlock/munlock. The bytes themselves
// are owned and accessed through the enclosing SecretBuffer.
unsafe impl Send for LockedRegion {}
unsafe impl Sync for LockedRegion {}

impl LockedRegion {
    fn try_lock(ptr: *const u8, len: usize) -> Self {
        let locked = platform::try_mlock(ptr, len);
        if !locked && len > 0 {
            static WARNED: std::sync::Once = std::sync::Once::new();
            WARNED.call_once(|| {
                tracing::warn!(
                    "mlock unavailable; key material may be swapped to disk \
                     (raise RLIMIT_MEMLOCK to avoid this)"
                );
            });
        }
        Self { ptr, len, locked }
    }
}

impl Drop for LockedRegion {
    fn drop(&mut self) {
        if self.locked {
            platform::try_munlock(self.ptr, self.len);
        }
    }
}

// ---------------------------------------------------------------------------
// SecretBuffer
// ---------------------------------------------------------------------------

/// Heap buffer for sensitive bytes.
///
/// Built on [`SecretSlice<u8>`]; the slice is zeroized when the buffer is
/// dropped. The backing allocation never moves, so the `mlock` taken at
/// construction stays valid for the buffer's lifetime.
pub struct SecretBuffer {
    inner: SecretSlice<u8>,
    lock: LockedRegion,
}

impl SecretBuffer {
    /// Copy `data` into a fresh locked allocation.
    ///
    /// The caller remains responsible for wiping its own copy of `data`.
    #[must_use]
    pub fn new(data: &[u8]) -> Self {
        let inner: SecretSlice<u8> = data.to_vec().into();
        let exposed = inner.expose_secret();
        let lock = LockedRegion::try_lock(exposed.as_ptr(), exposed.len());
        Self { inner, lock }
    }

    /// `len` bytes from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::SecureMemory` if the CSPRNG fails.
    pub fn random(len: usize) -> Result<Self, CryptoError> {
        let mut bytes = Zeroizing::new(vec![0u8; len]);
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::SecureMemory(format!("CSPRNG fill failed: {e}")))?;
        Ok(Self::new(&bytes))
    }

    /// Borrow the raw bytes. Keep the borrow as short as possible.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the pages backing this buffer are currently `mlock`ed.
    #[must_use]
    pub const fn is_mlocked(&self) -> bool {
        self.lock.locked
    }
}

impl Clone for SecretBuffer {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

impl fmt::Display for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

// ---------------------------------------------------------------------------
// Core dumps
// ---------------------------------------------------------------------------

/// Set `RLIMIT_CORE` to zero so a crash cannot dump a live KEK to disk.
///
/// No-op on non-Unix targets.
///
/// # Errors
///
/// Returns `CryptoError::SecureMemory` if `setrlimit` fails.
pub fn disable_core_dumps() -> Result<(), CryptoError> {
    platform::disable_core_dumps_impl()
}

#[cfg(unix)]
mod platform {
    use crate::error::CryptoError;

    pub(super) fn try_mlock(ptr: *const u8, len: usize) -> bool {
        if len == 0 {
            return true;
        }
        // SAFETY: ptr/len describe a live allocation owned by the caller;
        // an invalid range makes the kernel return an error, not fault.
        unsafe { libc::mlock(ptr.cast(), len) == 0 }
    }

    pub(super) fn try_munlock(ptr: *const u8, len: usize) {
        if len == 0 {
            return;
        }
        // SAFETY: see try_mlock. Failure here is harmless.
        unsafe {
            libc::munlock(ptr.cast(), len);
        }
    }

    pub(super) fn disable_core_dumps_impl() -> Result<(), CryptoError> {
        let limit = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: plain POSIX call on a stack-allocated rlimit.
        let ret = unsafe { libc::setrlimit(libc::RLIMIT_CORE, &raw const limit) };
        if ret != 0 {
            return Err(CryptoError::SecureMemory(
                "setrlimit(RLIMIT_CORE, 0) failed".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(not(unix))]
mod platform {
    use crate::error::CryptoError;

    pub(super) fn try_mlock(_ptr: *const u8, _len: usize) -> bool {
        false
    }

    pub(super) fn try_munlock(_ptr: *const u8, _len: usize) {}

    pub(super) fn disable_core_dumps_impl() -> Result<(), CryptoError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_copies_content() {
        let buf = SecretBuffer::new(b"wrapped key bytes");
        assert_eq!(buf.expose(), b"wrapped key bytes");
        assert_eq!(buf.len(), 17);
        assert!(!buf.is_empty());
    }

    #[test]
    fn empty_buffer() {
        let buf = SecretBuffer::new(&[]);
        assert!(buf.is_empty());
    }

    #[test]
    fn random_buffers_differ() {
        let a = SecretBuffer::random(32).unwrap();
        let b = SecretBuffer::random(32).unwrap();
        assert_eq!(a.len(), 32);
        assert_ne!(a.expose(), b.expose());
    }

    #[test]
    fn clone_is_independent_copy() {
        let a = SecretBuffer::new(&[7u8; 16]);
        let b = a.clone();
        assert_eq!(a.expose(), b.expose());
        assert_ne!(a.expose().as_ptr(), b.expose().as_ptr());
    }

    #[test]
    fn debug_and_display_are_masked() {
        let buf = SecretBuffer::new(b"hunter2");
        assert_eq!(format!("{buf:?}"), "SecretBuffer(***)");
        assert_eq!(format!("{buf}"), "SecretBuffer(***)");
    }

    #[cfg(unix)]
    #[test]
    fn disable_core_dumps_sets_zero_limit() {
        disable_core_dumps().unwrap();

        let mut limit = libc::rlimit {
            rlim_cur: 1,
            rlim_max: 1,
        };
        let ret = unsafe { libc::getrlimit(libc::RLIMIT_CORE, &raw mut limit) };
        assert_eq!(ret, 0);
        assert_eq!(limit.rlim_cur, 0);
    }
}
