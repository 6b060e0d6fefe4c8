use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use log::{debug, warn};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::token::TokenSet;

/// Key under which the driver session lives in a [`FileTokenStore`].
pub const DEFAULT_TOKEN_KEY: &str = "kos_taxi_driver_tokens";

/// Where the session credentials are kept between requests.
///
/// Called synchronously from inside the gateway; implementations need no
/// locking of their own beyond interior mutability, since only the gateway
/// writes.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<TokenSet>;
    fn store(&self, tokens: &TokenSet);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<TokenSet>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenSet) -> Self {
        Self { slot: Mutex::new(Some(tokens)) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<TokenSet> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn store(&self, tokens: &TokenSet) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(tokens.clone());
    }

    fn clear(&self) {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

/// JSON file used as a small key-value store: `{ "<key>": { ...TokenSet } }`.
///
/// Other keys in the same file are preserved. An entry that no longer parses
/// is dropped from the file and reported as absent. A file that is not a JSON
/// object is never overwritten. Writes go to a sibling temp file that is then
/// renamed over the target.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    key:  String,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_key(path, DEFAULT_TOKEN_KEY)
    }

    pub fn with_key(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self { path: path.into(), key: key.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when the file holds something other than a JSON object (or
    /// cannot be read); such a file is left alone.
    fn read_entries(&self) -> Option<Map<String, Value>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Some(Map::new()),
            Err(err) => {
                warn!("read token file {} failed: {err}", self.path.display());
                return None;
            }
        };
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(entries)) => Some(entries),
            Ok(_) | Err(_) => {
                warn!("token file {} is not a JSON object, leaving it untouched", self.path.display());
                None
            }
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        if let Err(err) = fs::create_dir_all(dir) {
            warn!("create token dir {} failed: {err}", dir.display());
            return;
        }
        let body = match serde_json::to_vec_pretty(entries) {
            Ok(body) => body,
            Err(err) => {
                warn!("serialise token file failed: {err}");
                return;
            }
        };

        let staged = NamedTempFile::new_in(dir).and_then(|mut tmp| {
            tmp.write_all(&body)?;
            tmp.as_file().sync_all()?;
            Ok(tmp)
        });
        let result = match staged {
            Ok(tmp) => tmp.persist(&self.path).map(drop).map_err(|err| err.error),
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            warn!("write token file {} failed: {err}", self.path.display());
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<TokenSet> {
        let mut entries = self.read_entries()?;
        let raw = entries.get(&self.key)?.clone();
        match serde_json::from_value::<TokenSet>(raw) {
            Ok(tokens) => Some(tokens),
            Err(err) => {
                warn!("stored tokens under {} are malformed ({err}), removing", self.key);
                entries.remove(&self.key);
                self.write_entries(&entries);
                None
            }
        }
    }

    fn store(&self, tokens: &TokenSet) {
        let Some(mut entries) = self.read_entries() else {
            warn!("tokens not persisted, {} would be clobbered", self.path.display());
            return;
        };
        match serde_json::to_value(tokens) {
            Ok(value) => {
                entries.insert(self.key.clone(), value);
                self.write_entries(&entries);
                debug!("tokens persisted to {}", self.path.display());
            }
            Err(err) => warn!("serialise tokens failed: {err}"),
        }
    }

    fn clear(&self) {
        let Some(mut entries) = self.read_entries() else {
            return;
        };
        if entries.remove(&self.key).is_some() {
            self.write_entries(&entries);
            debug!("tokens removed from {}", self.path.display());
        }
    }
}
