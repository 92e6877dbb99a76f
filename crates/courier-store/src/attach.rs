//! File persistence for message attachments, tied 1:1 to schedule records.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::error::Result;

/// Directory-backed storage for attachment files.
///
/// Each scheduled message owns at most one file. Filenames carry a unix
/// timestamp prefix so repeated uploads of `report.pdf` do not collide.
pub struct AttachmentStore {
    dir: PathBuf,
}

impl AttachmentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory files are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under a collision-resistant name and return the path.
    ///
    /// Creates the attachment directory on first use. Only the basename of
    /// `suggested_name` is kept — upload names come from the client.
    pub fn save(&self, bytes: &[u8], suggested_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let base = Path::new(suggested_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let path = self.dir.join(format!("{}_{}", Utc::now().timestamp(), base));
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), size = bytes.len(), "attachment saved");
        Ok(path)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub fn delete(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Swap a message's attachment: the old file (if any) is deleted first,
    /// then the new bytes are saved. `None` for `new` clears the slot.
    pub fn replace(
        &self,
        old: Option<&Path>,
        new: Option<(&[u8], &str)>,
    ) -> Result<Option<PathBuf>> {
        if let Some(old_path) = old {
            self.delete(old_path)?;
        }
        match new {
            Some((bytes, name)) => Ok(Some(self.save(bytes, name)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> AttachmentStore {
        AttachmentStore::new(dir.join("attachments"))
    }

    #[test]
    fn save_creates_the_directory_and_prefixes_the_name() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        let path = store.save(b"payload", "report.pdf").unwrap();
        assert!(path.exists());
        assert_eq!(path.parent(), Some(store.dir()));
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.ends_with("_report.pdf"));
        assert_eq!(fs::read(&path).unwrap(), b"payload");
    }

    #[test]
    fn save_keeps_only_the_basename() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        let path = store.save(b"x", "../../evil.txt").unwrap();
        assert_eq!(path.parent(), Some(store.dir()));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_evil.txt"));
    }

    #[test]
    fn delete_missing_file_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        store.delete(&store.dir().join("never_existed.bin")).unwrap();
    }

    #[test]
    fn replace_with_no_bytes_clears() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        let old = store.save(b"old", "a.txt").unwrap();
        let new = store.replace(Some(&old), None).unwrap();
        assert!(new.is_none());
        assert!(!old.exists());
    }

    #[test]
    fn replace_swaps_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        let old = store.save(b"old", "a.txt").unwrap();
        let new = store
            .replace(Some(&old), Some((b"new".as_slice(), "b.txt")))
            .unwrap()
            .expect("replacement path");
        assert!(!old.exists());
        assert!(new.exists());
        assert_eq!(fs::read(&new).unwrap(), b"new");
    }
}
