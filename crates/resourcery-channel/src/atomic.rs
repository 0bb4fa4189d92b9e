use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{ChannelError, Result};

/// Replace `path` through a synced sibling temp file.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = stage(path, data)?;
    if let Err(err) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    sync_parent(path)
}

/// Like [`write_bytes_atomic`], but fails with
/// [`ChannelError::AlreadyPublished`] when `path` exists. Readers never see a
/// partial file and a concurrent writer cannot replace a published one.
pub fn create_bytes_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = stage(path, data)?;
    let linked = std::fs::hard_link(&tmp_path, path);
    let _ = std::fs::remove_file(&tmp_path);
    match linked {
        Ok(()) => sync_parent(path),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            Err(ChannelError::AlreadyPublished(path.to_path_buf()))
        }
        Err(err) => Err(err.into()),
    }
}

fn stage(path: &Path, data: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(tmp_path)
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ChannelError::Invalid("invalid path for atomic write".to_string()))?;
    let tmp_name = format!(".{}.{}.tmp", file_name.to_string_lossy(), std::process::id());
    Ok(path.with_file_name(tmp_name))
}

fn sync_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(sync_dir(parent)?),
        _ => Ok(()),
    }
}

#[cfg(unix)]
fn sync_dir(path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(path)?;
    dir.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_refuses_to_replace_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results").join("step_a.json");

        create_bytes_atomic(&path, b"first").expect("create");
        let err = create_bytes_atomic(&path, b"second").expect_err("second create");
        assert!(matches!(err, ChannelError::AlreadyPublished(_)));
        assert_eq!(std::fs::read(&path).expect("read"), b"first");

        let entries = std::fs::read_dir(path.parent().expect("parent"))
            .expect("read dir")
            .count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn write_replaces_existing_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        write_bytes_atomic(&path, b"a = 1").expect("first write");
        write_bytes_atomic(&path, b"a = 2").expect("second write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "a = 2");
    }
}
