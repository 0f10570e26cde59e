//! Durable string key-value store for client-side state such as the session
//! token and the last opened channel.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{error::StoreError, settings_store::write_json_file};

pub const SESSION_FILE: &str = "session.json";

pub mod keys {
    pub const TOKEN: &str = "token";
    pub const SERVER: &str = "server";
    pub const LAST_CHANNEL: &str = "last_channel";
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl LocalStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.into());
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    /// Non-blank session token, if one is stored.
    pub fn token(&self) -> Option<&str> {
        self.get(keys::TOKEN).filter(|token| !token.trim().is_empty())
    }

    fn flush(&self) -> Result<(), StoreError> {
        write_json_file(&self.path, &self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SESSION_FILE);

        let mut store = LocalStore::open(&path).expect("open");
        store.set(keys::TOKEN, "abc").expect("set token");
        store.set(keys::LAST_CHANNEL, "7").expect("set channel");

        let reopened = LocalStore::open(&path).expect("reopen");
        assert_eq!(reopened.token(), Some("abc"));
        assert_eq!(reopened.get(keys::LAST_CHANNEL), Some("7"));
    }

    #[test]
    fn removed_keys_stay_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SESSION_FILE);

        let mut store = LocalStore::open(&path).expect("open");
        store.set(keys::TOKEN, "abc").expect("set");
        store.remove(keys::TOKEN).expect("remove");
        store.remove("never-set").expect("remove missing");

        assert!(LocalStore::open(&path).expect("reopen").token().is_none());
    }

    #[test]
    fn blank_token_does_not_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = LocalStore::open(dir.path().join(SESSION_FILE)).expect("open");
        store.set(keys::TOKEN, "  ").expect("set");
        assert!(store.token().is_none());
    }
}
