//! On-disk persistence of [`AppSettings`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use shared::settings::{AppSettings, SettingUpdate};
use tracing::{debug, info};

use crate::error::StoreError;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store rooted at `dir`, using the conventional file name.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings file. On first run the defaults are written out
    /// and returned.
    pub fn load(&self) -> Result<AppSettings, StoreError> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "settings file missing; writing defaults");
            let defaults = AppSettings::default();
            self.save(&defaults)?;
            return Ok(defaults);
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, settings: &AppSettings) -> Result<(), StoreError> {
        write_json_file(&self.path, settings)?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }

    /// Load, change one field, save. Returns the stored result.
    pub fn apply(&self, update: SettingUpdate) -> Result<AppSettings, StoreError> {
        let mut settings = self.load()?;
        settings.apply(update);
        self.save(&settings)?;
        Ok(settings)
    }
}

pub(crate) fn write_json_file<T: serde::Serialize>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let contents = serde_json::to_string_pretty(value).map_err(StoreError::Encode)?;
    fs::write(path, contents).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::settings::Theme;

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::in_dir(dir.path().join("nested"));

        let settings = store.load().expect("load");
        assert_eq!(settings, AppSettings::default());
        assert!(store.path().exists());
    }

    #[test]
    fn updates_round_trip_through_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::in_dir(dir.path());

        store
            .apply(SettingUpdate::ServerUrl("chat.example.org:8000".into()))
            .expect("server url");
        store.apply(SettingUpdate::Theme(Theme::Dark)).expect("theme");

        let reopened = SettingsStore::in_dir(dir.path()).load().expect("reload");
        assert_eq!(reopened.server_url, "chat.example.org:8000");
        assert_eq!(reopened.theme, Theme::Dark);
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::in_dir(dir.path());
        fs::write(store.path(), "{not json").expect("write");

        let err = store.load().expect_err("must fail");
        assert!(matches!(err, StoreError::Parse { .. }));
    }
}
