//! File-backed key/value storage for the app settings blob.
//!
//! One `<key>.json` file per key inside the register's data directory. A
//! missing file reads as an absent key.

use std::io;
use std::path::{Path, PathBuf};

use aura_core::KeyValueStorage;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileSettingsStorage {
    dir: PathBuf,
}

impl FileSettingsStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSettingsStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // keys come from code, but keep them inside the directory anyway
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStorage for FileSettingsStorage {
    type Error = io::Error;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        std::fs::write(&path, value)?;
        debug!(?path, "setting written");
        Ok(())
    }
}
