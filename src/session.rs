//! Session-scoped key/value storage.
//!
//! Values written here outlive a single page load but belong to one browsing
//! session. [`MemorySessionStore`] covers a session that lives inside one
//! process; [`FileSessionStore`] keeps one file per key in a session directory
//! so that successive processes (page loads) observe each other's writes.

use anyhow::{Context, Result, ensure};
use log::{debug, error};
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.items.lock() {
            Ok(items) => items.get(key).cloned(),
            Err(e) => {
                error!("failed to lock session items: {e}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .lock()
            .map_err(|_| anyhow::anyhow!("failed to lock session items: poisoned"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.items
            .lock()
            .map_err(|_| anyhow::anyhow!("failed to lock session items: poisoned"))?
            .remove(key);
        Ok(())
    }
}

/// Session store backed by one file per key.
#[derive(Clone, Debug)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Open (and create if needed) the session directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create session directory {dir:?}"))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        ensure!(valid, "failed to map session key {key:?} to a file name");
        Ok(self.dir.join(key))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = match self.path(key) {
            Ok(path) => path,
            Err(e) => {
                error!("{e:#}");
                return None;
            }
        };

        match fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                error!("failed to read session item {key}: {e}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path(key)?;
        debug!("setting session item {key} at: {path:?}");
        fs::write(&path, value).with_context(|| format!("failed to write session item {key}"))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("removed session item {key}");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove session item {key}")),
        }
    }
}
