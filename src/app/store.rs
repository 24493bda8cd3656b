//! Document storage the logger and detector read from and write to.
//!
//! Paths are strings in the vault's own convention: relative paths are
//! resolved against the vault root, absolute ones are used as given.

use anyhow::{bail, Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// What a path points at, when it points at anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Document,
    Folder,
}

pub trait DocumentStore {
    fn read(&self, path: &str) -> Result<String>;
    fn lookup(&self, path: &str) -> Option<Entry>;
    /// Creates a new document. Fails if it already exists or its folder is missing.
    fn create(&self, path: &str, content: &str) -> Result<()>;
    fn overwrite(&self, path: &str, content: &str) -> Result<()>;
    fn create_dir(&self, path: &str) -> Result<()>;
}

/// Leading `/` or `\`, or a drive letter followed by `:`.
pub fn is_absolute_path(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic()
    )
}

/// A vault backed by a directory on the local filesystem.
pub struct VaultStore {
    root: PathBuf,
}

impl VaultStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        if is_absolute_path(path) {
            PathBuf::from(path)
        } else {
            self.root.join(path)
        }
    }
}

impl DocumentStore for VaultStore {
    fn read(&self, path: &str) -> Result<String> {
        let full = self.resolve(path);
        fs::read_to_string(&full).context(format!("Failed to read {:?}", full))
    }

    fn lookup(&self, path: &str) -> Option<Entry> {
        let meta = fs::metadata(self.resolve(path)).ok()?;
        if meta.is_dir() {
            Some(Entry::Folder)
        } else {
            Some(Entry::Document)
        }
    }

    fn create(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .context(format!("Failed to create {:?}", full))?;
        file.write_all(content.as_bytes())
            .context(format!("Failed to write {:?}", full))?;
        log::debug!("Created {:?}", full);
        Ok(())
    }

    fn overwrite(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path);
        if !full.is_file() {
            bail!("Cannot modify {:?}: no such document", full);
        }
        fs::write(&full, content).context(format!("Failed to write {:?}", full))
    }

    fn create_dir(&self, path: &str) -> Result<()> {
        let full = self.resolve(path);
        fs::create_dir_all(&full).context(format!("Failed to create folder {:?}", full))?;
        log::info!("Created folder {:?}", full);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_path_detection() {
        assert!(is_absolute_path("/Users/me/logs"));
        assert!(is_absolute_path("\\\\server\\share"));
        assert!(is_absolute_path("C:\\Users\\me"));
        assert!(is_absolute_path("d:/notes"));
        assert!(!is_absolute_path("logs"));
        assert!(!is_absolute_path("logs/daily"));
        assert!(!is_absolute_path(""));
        assert!(!is_absolute_path("1:odd"));
        assert!(is_absolute_path("C:"));
    }

    #[test]
    fn create_refuses_existing_and_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = VaultStore::new(dir.path().to_path_buf());

        store.create("a.md", "one").unwrap();
        assert!(store.create("a.md", "two").is_err());
        assert_eq!(store.read("a.md").unwrap(), "one");

        assert!(store.create("logs/a.md", "x").is_err());
        store.create_dir("logs").unwrap();
        assert_eq!(store.lookup("logs"), Some(Entry::Folder));
        store.create("logs/a.md", "x").unwrap();
        assert_eq!(store.lookup("logs/a.md"), Some(Entry::Document));
    }

    #[test]
    fn overwrite_requires_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = VaultStore::new(dir.path().to_path_buf());

        assert!(store.overwrite("missing.md", "x").is_err());
        store.create("doc.md", "old").unwrap();
        store.overwrite("doc.md", "new").unwrap();
        assert_eq!(store.read("doc.md").unwrap(), "new");
    }

    #[test]
    fn absolute_paths_bypass_vault_root() {
        let vault = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let store = VaultStore::new(vault.path().to_path_buf());

        let target = outside.path().join("log.md");
        let target_str = target.to_str().unwrap();
        store.create(target_str, "abs").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "abs");
        assert_eq!(store.lookup("log.md"), None);
    }
}
