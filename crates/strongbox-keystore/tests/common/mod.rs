//! Shared fixtures for keystore integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use strongbox_keystore::{KeyStoreConfig, PermissionModel};
use tempfile::TempDir;

/// Route `tracing` output through the test harness. `RUST_LOG` filters.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn pool_path(dir: &TempDir) -> PathBuf {
    dir.path().join("keyfile")
}

/// Default sizes, platform default permission model.
pub fn config(dir: &TempDir) -> KeyStoreConfig {
    KeyStoreConfig::new(pool_path(dir))
}

pub fn read_only_config(dir: &TempDir) -> KeyStoreConfig {
    config(dir).with_permission_model(PermissionModel::ReadOnlyAttribute)
}

/// Make a locked-down pool writable, let `edit` change its text, then lock
/// it down again with the same profile.
#[allow(clippy::permissions_set_readonly_false)]
pub fn rewrite_pool(path: &Path, edit: impl FnOnce(&mut Vec<u8>)) {
    let original = fs::metadata(path).unwrap().permissions();
    let mut writable = original.clone();
    writable.set_readonly(false);
    fs::set_permissions(path, writable).unwrap();

    let mut text = fs::read(path).unwrap();
    edit(&mut text);
    fs::write(path, &text).unwrap();

    fs::set_permissions(path, original).unwrap();
}

/// Flip the low bit of the hex digit at `index`, which flips one bit of
/// the decoded byte.
pub fn flip_hex_digit(text: &mut [u8], index: usize) {
    let value = match text[index] {
        c @ b'0'..=b'9' => c - b'0',
        c @ b'A'..=b'F' => c - b'A' + 10,
        c @ b'a'..=b'f' => c - b'a' + 10,
        other => panic!("not a hex digit: {other}"),
    };
    let flipped = value ^ 1;
    text[index] = if flipped < 10 {
        b'0' + flipped
    } else {
        b'A' + flipped - 10
    };
}

#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(unix)]
pub fn mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}
