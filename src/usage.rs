//! Usage statistics store: a JSON map keyed by `category/name`, with a
//! lifecycle independent from the metadata records — a tool can be run
//! before its record exists.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::paths::StorageRoot;
use crate::tool::timestamp_now;

pub const USAGE_FILE_NAME: &str = "tools_usage.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageRecord {
    pub name: String,
    pub category: String,
    pub path: String,
    pub first_added: String,
    pub last_used: String,
    pub usage_count: u64,
}

#[derive(Debug)]
pub struct UsageStore {
    path: PathBuf,
    records: BTreeMap<String, UsageRecord>,
}

impl UsageStore {
    /// Loads the usage file; a missing or unreadable file degrades to an
    /// empty store rather than failing startup.
    pub fn load(path: &Path) -> Self {
        let records = if path.exists() {
            match fs::read(path)
                .map_err(anyhow::Error::from)
                .and_then(|data| serde_json::from_slice(&data).map_err(anyhow::Error::from))
            {
                Ok(records) => records,
                Err(err) => {
                    tracing::warn!(path = ?path, error = %err, "failed to load usage store; starting empty");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        Self {
            path: path.to_path_buf(),
            records,
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&self.records)?)
            .with_context(|| format!("Failed to write usage store {:?}", self.path))?;
        Ok(())
    }

    fn save_logged(&self) {
        if let Err(err) = self.save() {
            tracing::warn!(path = ?self.path, error = %err, "usage write failed; keeping in-memory state");
        }
    }

    /// Records one run: creates with count 1 on first occurrence, otherwise
    /// increments and refreshes `last_used`.
    pub fn record_usage(&mut self, tool_path: &Path, name: &str, category: &str) {
        let key = format!("{category}/{name}");
        let now = timestamp_now();
        self.records
            .entry(key)
            .and_modify(|record| {
                record.last_used = now.clone();
                record.usage_count += 1;
            })
            .or_insert_with(|| UsageRecord {
                name: name.to_string(),
                category: category.to_string(),
                path: tool_path.to_string_lossy().into_owned(),
                first_added: now.clone(),
                last_used: now,
                usage_count: 1,
            });
        self.save_logged();
    }

    pub fn get(&self, category: &str, name: &str) -> Option<&UsageRecord> {
        self.records.get(&format!("{category}/{name}"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &UsageRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops entries whose recorded path no longer resolves to an existing
    /// file inside the root. Returns how many were removed. Flushing is left
    /// to the caller (the shared prune pass).
    pub(crate) fn prune(&mut self, root: &StorageRoot) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| {
            root.resolve_key(&record.path)
                .map(|abs| abs.exists())
                .unwrap_or(false)
        });
        let removed = before - self.records.len();
        if removed > 0 {
            self.save_logged();
        }
        removed
    }

    /// Removes entries recorded for one specific tool path.
    pub(crate) fn remove_path(&mut self, root: &StorageRoot, path: &Path) -> usize {
        let key = root.key_for(path);
        let before = self.records.len();
        self.records
            .retain(|_, record| root.key_for(Path::new(&record.path)) != key);
        let removed = before - self.records.len();
        if removed > 0 {
            self.save_logged();
        }
        removed
    }
}
