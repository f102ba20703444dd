//! Catalog configuration: the TOML document carrying the category tree,
//! per-tool display overrides, and the tool-added record rows.
//!
//! The section/key contract is fixed: `General` for typed settings,
//! `Categories` (`count`, `"1".."N"` -> name), `Subcategories`
//! (`"{main}_{n}"` -> name), `ToolInfo` (`"{absPath}_name"` /
//! `"{absPath}_note"` display overrides) and `ToolAddedRecord`
//! (normalized key -> pipe-delimited six-field record string).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "ToolChest.toml";

/// The whole persisted config document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    #[serde(rename = "General", default)]
    pub general: GeneralSettings,
    #[serde(rename = "Categories", default)]
    pub categories: BTreeMap<String, String>,
    #[serde(rename = "Subcategories", default)]
    pub subcategories: BTreeMap<String, String>,
    #[serde(rename = "ToolInfo", default)]
    pub tool_info: BTreeMap<String, String>,
    #[serde(rename = "ToolAddedRecord", default)]
    pub tool_added_record: BTreeMap<String, String>,
}

/// Typed settings under `[General]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Whether catalog loads create metadata records for newly seen files.
    #[serde(default = "default_auto_record")]
    pub auto_record: bool,
    /// Interval for the background refresh scheduler.
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    /// Extension allow-list the scanner filters by (lowercase, with dot).
    #[serde(default = "default_supported_extensions")]
    pub supported_extensions: Vec<String>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            auto_record: default_auto_record(),
            scan_interval_secs: default_scan_interval_secs(),
            supported_extensions: default_supported_extensions(),
        }
    }
}

const fn default_auto_record() -> bool {
    true
}

const fn default_scan_interval_secs() -> u64 {
    30
}

fn default_supported_extensions() -> Vec<String> {
    [
        ".exe", ".msi", ".com", ".zip", ".rar", ".7z", ".tar", ".gz", ".pdf", ".txt", ".md",
        ".docx", ".xlsx", ".pptx", ".bat", ".cmd", ".ps1", ".sh", ".py", ".reg", ".lnk", ".png",
        ".jpg", ".jpeg", ".mp4", ".mp3",
    ]
    .iter()
    .map(|ext| ext.to_string())
    .collect()
}

const COUNT_KEY: &str = "count";
const NAME_SUFFIX: &str = "_name";
const NOTE_SUFFIX: &str = "_note";

/// Owner of the persisted config document; write-through after every
/// mutation, no batching.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    doc: CatalogConfig,
}

impl ConfigStore {
    /// Loads the config, creating a default one (and completing missing
    /// sections) when absent or partial.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        let mut store = if path.exists() {
            let data = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {:?}", path))?;
            let doc: CatalogConfig = toml::from_str(&data)
                .with_context(|| format!("Failed to parse config file {:?}", path))?;
            Self {
                path: path.to_path_buf(),
                doc,
            }
        } else {
            Self {
                path: path.to_path_buf(),
                doc: CatalogConfig::default(),
            }
        };
        if !store.doc.categories.contains_key(COUNT_KEY) {
            store
                .doc
                .categories
                .insert(COUNT_KEY.to_string(), "0".to_string());
        }
        store.save()?;
        Ok(store)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = toml::to_string_pretty(&self.doc)?;
        fs::write(&self.path, data)
            .with_context(|| format!("Failed to write config file {:?}", self.path))?;
        Ok(())
    }

    /// Write-through save on the availability-over-durability paths: a
    /// failure is logged and the in-memory state stays authoritative.
    pub(crate) fn save_logged(&self) {
        if let Err(err) = self.save() {
            tracing::warn!(path = ?self.path, error = %err, "config write failed; keeping in-memory state");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn general(&self) -> &GeneralSettings {
        &self.doc.general
    }

    // ----- Categories -----

    pub fn category_count(&self) -> u32 {
        self.doc
            .categories
            .get(COUNT_KEY)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0)
    }

    pub(crate) fn set_category_count(&mut self, count: u32) {
        self.doc
            .categories
            .insert(COUNT_KEY.to_string(), count.to_string());
    }

    pub fn category_name(&self, ordinal: u32) -> Option<String> {
        self.doc.categories.get(&ordinal.to_string()).cloned()
    }

    pub(crate) fn set_category_name(&mut self, ordinal: u32, name: &str) {
        self.doc
            .categories
            .insert(ordinal.to_string(), name.to_string());
    }

    pub(crate) fn remove_category_name(&mut self, ordinal: u32) {
        self.doc.categories.remove(&ordinal.to_string());
    }

    // ----- Subcategories -----

    pub fn subcategory_name(&self, main: u32, sub: u32) -> Option<String> {
        self.doc.subcategories.get(&sub_key(main, sub)).cloned()
    }

    pub(crate) fn set_subcategory_name(&mut self, main: u32, sub: u32, name: &str) {
        self.doc
            .subcategories
            .insert(sub_key(main, sub), name.to_string());
    }

    pub(crate) fn remove_subcategory_name(&mut self, main: u32, sub: u32) {
        self.doc.subcategories.remove(&sub_key(main, sub));
    }

    /// Sorted subcategory ordinals recorded for a main category.
    pub fn subcategory_ordinals(&self, main: u32) -> Vec<u32> {
        let prefix = format!("{main}_");
        let mut ordinals: Vec<u32> = self
            .doc
            .subcategories
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.parse().ok())
            .collect();
        ordinals.sort_unstable();
        ordinals
    }

    /// Replaces the whole subcategory section; used when main-category
    /// deletion re-numbers the ordinals the keys embed.
    pub(crate) fn replace_subcategories(&mut self, entries: BTreeMap<String, String>) {
        self.doc.subcategories = entries;
    }

    pub(crate) fn subcategories(&self) -> &BTreeMap<String, String> {
        &self.doc.subcategories
    }

    // ----- ToolAddedRecord -----

    pub fn record_raw(&self, key: &str) -> Option<&String> {
        self.doc.tool_added_record.get(key)
    }

    pub(crate) fn set_record_raw(&mut self, key: &str, value: String) {
        self.doc.tool_added_record.insert(key.to_string(), value);
    }

    pub(crate) fn remove_record_raw(&mut self, key: &str) -> bool {
        self.doc.tool_added_record.remove(key).is_some()
    }

    pub fn record_keys(&self) -> Vec<String> {
        self.doc.tool_added_record.keys().cloned().collect()
    }

    // ----- ToolInfo display overrides -----

    pub fn custom_name(&self, path: &Path) -> Option<String> {
        self.doc
            .tool_info
            .get(&override_key(path, NAME_SUFFIX))
            .cloned()
    }

    pub fn custom_note(&self, path: &Path) -> Option<String> {
        self.doc
            .tool_info
            .get(&override_key(path, NOTE_SUFFIX))
            .cloned()
    }

    /// Sets or clears (`None` / empty) the display-name override.
    pub(crate) fn set_custom_name(&mut self, path: &Path, name: Option<&str>) {
        let key = override_key(path, NAME_SUFFIX);
        match name {
            Some(name) if !name.is_empty() => {
                self.doc.tool_info.insert(key, name.to_string());
            }
            _ => {
                self.doc.tool_info.remove(&key);
            }
        }
    }

    pub(crate) fn set_custom_note(&mut self, path: &Path, note: Option<&str>) {
        let key = override_key(path, NOTE_SUFFIX);
        match note {
            Some(note) if !note.is_empty() => {
                self.doc.tool_info.insert(key, note.to_string());
            }
            _ => {
                self.doc.tool_info.remove(&key);
            }
        }
    }

    /// Removes both overrides for a path. Returns how many were present.
    pub(crate) fn remove_overrides_for(&mut self, path: &Path) -> usize {
        let mut removed = 0;
        for suffix in [NAME_SUFFIX, NOTE_SUFFIX] {
            if self.doc.tool_info.remove(&override_key(path, suffix)).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Distinct absolute paths the override namespace refers to.
    pub(crate) fn override_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .doc
            .tool_info
            .keys()
            .filter_map(|key| {
                key.strip_suffix(NAME_SUFFIX)
                    .or_else(|| key.strip_suffix(NOTE_SUFFIX))
            })
            .map(PathBuf::from)
            .collect();
        paths.sort();
        paths.dedup();
        paths
    }
}

fn sub_key(main: u32, sub: u32) -> String {
    format!("{main}_{sub}")
}

fn override_key(path: &Path, suffix: &str) -> String {
    format!("{}{}", path.display(), suffix)
}
