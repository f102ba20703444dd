//! Persisted tool metadata records: creation-on-discovery, user edits, and
//! pruning of stale or out-of-root entries.
//!
//! The in-memory index is the single writable instance; every mutation is
//! written through to the config document. A write failure is logged and the
//! in-memory state stays authoritative for the session.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use crate::config::ConfigStore;
use crate::paths::{normalize_key, StorageRoot};
use crate::tool::{probe_version, timestamp_now, ToolKind, ToolRecord, TIME_FORMAT};
use crate::usage::UsageStore;

/// Counts from one prune pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    pub records_removed: usize,
    pub overrides_removed: usize,
    pub usage_removed: usize,
}

impl PruneReport {
    pub fn is_clean(&self) -> bool {
        self.records_removed == 0 && self.overrides_removed == 0 && self.usage_removed == 0
    }
}

/// In-memory index over the persisted `ToolAddedRecord` section.
#[derive(Debug, Default)]
pub struct MetadataStore {
    index: std::collections::BTreeMap<String, ToolRecord>,
}

impl MetadataStore {
    /// Builds the index from the persisted section, re-keying legacy rows to
    /// the current normalized form and dropping malformed ones. Migrated or
    /// malformed rows are rewritten so the persisted section converges on
    /// the normalized shape.
    pub fn load(config: &mut ConfigStore, root: &StorageRoot) -> Self {
        let mut store = Self::default();
        let mut changed = false;
        for key in config.record_keys() {
            let raw = match config.record_raw(&key) {
                Some(raw) => raw.clone(),
                None => continue,
            };
            let Some(record) = ToolRecord::parse(&raw) else {
                tracing::warn!(key = %key, "dropping malformed record row");
                config.remove_record_raw(&key);
                changed = true;
                continue;
            };
            // Legacy rows may be keyed by an absolute path inside the root
            // or by an unfolded spelling; converge on key_for.
            let canonical = match root.resolve_key(&normalize_key(&key)) {
                Some(abs) => root.key_for(&abs),
                None => normalize_key(&key),
            };
            if canonical != key {
                config.remove_record_raw(&key);
                config.set_record_raw(&canonical, record.to_field_string());
                changed = true;
            }
            store.index.insert(canonical, record);
        }
        if changed {
            config.save_logged();
        }
        store
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.index.keys()
    }

    pub fn get_by_key(&self, key: &str) -> Option<&ToolRecord> {
        self.index.get(&normalize_key(key))
    }

    pub fn get(&self, root: &StorageRoot, path: &Path) -> Option<&ToolRecord> {
        self.index.get(&root.key_for(path))
    }

    /// Creates a record the first time a path is observed; a no-op when one
    /// already exists. Version extraction failures never block creation.
    pub fn ensure_record(
        &mut self,
        config: &mut ConfigStore,
        root: &StorageRoot,
        path: &Path,
        display_name: &str,
        category: &str,
        note: &str,
    ) {
        let key = root.key_for(path);
        if self.index.contains_key(&key) {
            return;
        }
        let add_time = creation_time(path).unwrap_or_else(timestamp_now);
        let kind = extension_of(path)
            .map(|ext| ToolKind::from_extension(&ext))
            .unwrap_or(ToolKind::Other);
        let record = ToolRecord {
            name: display_name.to_string(),
            category: category.to_string(),
            add_time,
            kind: kind.label().to_string(),
            note: note.to_string(),
            version: probe_version(path),
        };
        config.set_record_raw(&key, record.to_field_string());
        config.save_logged();
        self.index.insert(key, record);
    }

    /// Updates the persisted display name; synthesizes a minimal record
    /// first when none exists. Also writes the display-override entry.
    pub fn update_name(
        &mut self,
        config: &mut ConfigStore,
        root: &StorageRoot,
        path: &Path,
        name: &str,
    ) {
        let key = root.key_for(path);
        let mut record = self
            .index
            .get(&key)
            .cloned()
            .unwrap_or_else(|| minimal_record(path));
        if !name.is_empty() {
            record.name = name.to_string();
        }
        config.set_custom_name(path, Some(name));
        config.set_record_raw(&key, record.to_field_string());
        config.save_logged();
        self.index.insert(key, record);
    }

    /// Updates the persisted note; synthesizes a minimal record first when
    /// none exists. Also writes the display-override entry.
    pub fn update_note(
        &mut self,
        config: &mut ConfigStore,
        root: &StorageRoot,
        path: &Path,
        note: &str,
    ) {
        let key = root.key_for(path);
        let mut record = self
            .index
            .get(&key)
            .cloned()
            .unwrap_or_else(|| minimal_record(path));
        record.note = note.to_string();
        config.set_custom_note(path, Some(note));
        config.set_record_raw(&key, record.to_field_string());
        config.save_logged();
        self.index.insert(key, record);
    }

    /// Removes every record whose key escapes the root, resolves outside it,
    /// or matches no file on disk. Keys are case-folded, so absence is
    /// confirmed by `locate_key`'s folded directory-entry match rather than a
    /// literal lookup. The display-override and usage entries for vanished
    /// paths are swept in the same pass (override keys carry the original
    /// casing, so they are checked by their own path). Idempotent; runs
    /// before every catalog load so the stores self-heal.
    pub fn prune(
        &mut self,
        config: &mut ConfigStore,
        usage: &mut UsageStore,
        root: &StorageRoot,
    ) -> PruneReport {
        let mut report = PruneReport::default();
        for key in config.record_keys() {
            if root.locate_key(&key).is_some() {
                continue;
            }
            config.remove_record_raw(&key);
            self.index.remove(&normalize_key(&key));
            report.records_removed += 1;
            tracing::debug!(key = %key, "pruned stale tool record");
        }
        for path in config.override_paths() {
            if root.contains(&path) && path.exists() {
                continue;
            }
            report.overrides_removed += config.remove_overrides_for(&path);
        }
        report.usage_removed = usage.prune(root);
        if report.records_removed > 0 || report.overrides_removed > 0 {
            config.save_logged();
        }
        report
    }

    /// Deletes the underlying file (best effort) and performs the single-key
    /// cleanup `prune` would: record, display overrides, usage entries, and
    /// same-stem icon sidecars. The cleanup always runs; a file-removal
    /// failure is reported afterwards so the store never disagrees with a
    /// user-intended deletion.
    pub fn delete(
        &mut self,
        config: &mut ConfigStore,
        usage: &mut UsageStore,
        root: &StorageRoot,
        path: &Path,
    ) -> Result<()> {
        let abs = root.resolve(path);
        let removal_error = if abs.exists() {
            fs::remove_file(&abs).err()
        } else {
            None
        };
        for sidecar_ext in ["ico", "png"] {
            let sidecar = abs.with_extension(sidecar_ext);
            if sidecar != abs && sidecar.exists() {
                if let Err(err) = fs::remove_file(&sidecar) {
                    tracing::warn!(sidecar = ?sidecar, error = %err, "failed to remove icon sidecar");
                }
            }
        }
        let key = root.key_for(&abs);
        config.remove_record_raw(&key);
        self.index.remove(&key);
        config.remove_overrides_for(&abs);
        usage.remove_path(root, &abs);
        config.save()?;
        usage.save()?;
        if let Some(err) = removal_error {
            return Err(err).with_context(|| format!("Failed to delete tool file {:?}", abs));
        }
        Ok(())
    }
}

/// Minimal record for a path edited before any scan observed it: name and
/// type inferred, add_time is now.
fn minimal_record(path: &Path) -> ToolRecord {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kind = extension_of(path)
        .map(|ext| ToolKind::from_extension(&ext))
        .unwrap_or(ToolKind::Other);
    ToolRecord {
        name: stem,
        category: String::new(),
        add_time: timestamp_now(),
        kind: kind.label().to_string(),
        note: String::new(),
        version: probe_version(path),
    }
}

/// File creation time where the platform exposes it (on Windows that is the
/// copy time, which is what "added to the toolbox" means).
fn creation_time(path: &Path) -> Option<String> {
    let created = fs::metadata(path).ok()?.created().ok()?;
    Some(DateTime::<Local>::from(created).format(TIME_FORMAT).to_string())
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().into_owned())
}
