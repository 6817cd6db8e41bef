use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, PoisonError,
    },
};

use anyhow::{Context, Result};
use log::warn;
use serde_json::{Map, Value};

use super::KeyValueStore;

pub const PREFS_FILE_NAME: &str = "focaccia_prefs.json";

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// All keys in one JSON object on disk.
///
/// Several processes may hold a store on the same file. Reads always go to
/// disk, and a write re-reads the file and changes only its own key before
/// swapping the new contents in with a rename, so writers of different keys
/// never undo each other.
pub struct FileStore {
    path: PathBuf,
    /// Last contents read successfully; served if the file becomes unreadable.
    last_good: Mutex<Map<String, Value>>,
}

impl FileStore {
    /// Open `<data_dir>/focaccia_prefs.json`, creating the directory if needed.
    pub fn in_dir(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir).with_context(|| {
            format!("Failed to create settings directory {}", data_dir.display())
        })?;
        Self::open(data_dir.join(PREFS_FILE_NAME))
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let data = read_map(&path)?;
        Ok(Self {
            path,
            last_good: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn snapshot(&self) -> Map<String, Value> {
        let mut last_good = self.last_good.lock().unwrap_or_else(PoisonError::into_inner);
        match read_map(&self.path) {
            Ok(map) => {
                *last_good = map.clone();
                map
            }
            Err(err) => {
                warn!("{err:#}; using last known settings");
                last_good.clone()
            }
        }
    }

    fn update(&self, apply: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        // Holding the lock serializes writers within this process.
        let mut last_good = self.last_good.lock().unwrap_or_else(PoisonError::into_inner);
        let mut data = read_map(&self.path)?;
        apply(&mut data);
        self.persist(&data)?;
        *last_good = data;
        Ok(())
    }

    fn persist(&self, data: &Map<String, Value>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp_path = self
            .path
            .with_extension(format!("json.{}-{seq}.tmp", std::process::id()));
        fs::write(&tmp_path, serialized)
            .with_context(|| format!("Failed to write settings to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace settings at {}", self.path.display()))
    }
}

/// A missing file is an empty store; so is one that is not a JSON object.
fn read_map(path: &Path) -> Result<Map<String, Value>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to read settings from {}", path.display()))
        }
    };

    match serde_json::from_str::<Map<String, Value>>(&contents) {
        Ok(map) => Ok(map),
        Err(err) => {
            warn!(
                "Settings file {} is not a JSON object ({err}); treating as empty",
                path.display()
            );
            Ok(Map::new())
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.snapshot().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value);
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|map| {
            map.remove(key);
        })
    }
}
