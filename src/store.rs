use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A store persisted as one JSON object, rewritten on every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = fs::read_to_string(path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };
        debug!("Opened key-value store at {:?} with {} keys", path, entries.len());
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Per-user pinned company names, kept in an injected store.
pub struct PinnedAccounts<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> PinnedAccounts<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn key(reference_id: &str) -> String {
        format!("pinned:{reference_id}")
    }

    pub fn list(&self, reference_id: &str) -> Result<Vec<String>> {
        match self.store.get(&Self::key(reference_id)) {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn pin(&mut self, reference_id: &str, company: &str) -> Result<Vec<String>> {
        let mut pinned = self.list(reference_id)?;
        if !pinned.iter().any(|existing| existing == company) {
            pinned.push(company.to_string());
            self.store
                .set(&Self::key(reference_id), serde_json::to_string(&pinned)?)?;
        }
        Ok(pinned)
    }

    pub fn unpin(&mut self, reference_id: &str, company: &str) -> Result<Vec<String>> {
        let mut pinned = self.list(reference_id)?;
        pinned.retain(|existing| existing != company);
        if pinned.is_empty() {
            self.store.remove(&Self::key(reference_id))?;
        } else {
            self.store
                .set(&Self::key(reference_id), serde_json::to_string(&pinned)?)?;
        }
        Ok(pinned)
    }
}
