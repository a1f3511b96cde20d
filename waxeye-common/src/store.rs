//! Persistent settings store
//!
//! File-backed key/value storage for the handful of values that must survive
//! a restart: the OAuth session (access token, refresh token, expiry) and the
//! selected playback device. The file is read once at `open` and rewritten
//! synchronously after every `set`, so a crash between writes never loses an
//! acknowledged change.
//!
//! The on-disk format is a flat JSON object of strings. Nothing outside this
//! type touches the file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::{Error, Result};

/// File-backed key/value store, loaded once, flushed on every write
pub struct SettingsStore {
    path: PathBuf,
    data: Mutex<HashMap<String, String>>,
}

impl SettingsStore {
    /// Open the store at `path`, loading existing contents if present.
    ///
    /// A missing file is an empty store, not an error; the file is created
    /// on the first `set`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| Error::Config(format!("settings file {:?} is corrupt: {}", path, e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Read a value; `None` when the key has never been set
    pub fn get(&self, key: &str) -> Option<String> {
        let data = self.data.lock().expect("settings store lock poisoned");
        data.get(key).cloned()
    }

    /// Write a value and flush the whole map to disk before returning
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self.data.lock().expect("settings store lock poisoned");
        data.insert(key.to_string(), value.to_string());
        self.flush(&data)
    }

    /// True when the key holds a non-empty value
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).map(|v| !v.is_empty()).unwrap_or(false)
    }

    fn flush(&self, data: &HashMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
