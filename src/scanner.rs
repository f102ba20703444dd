//! Directory scanning: turns files under the storage root into transient
//! tool entries, merging in persisted names and notes.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use walkdir::WalkDir;

use crate::categories::CATEGORY_MARKER;
use crate::config::ConfigStore;
use crate::paths::StorageRoot;
use crate::records::MetadataStore;
use crate::tool::{ToolEntry, ToolKind};

/// Display label used when the whole root is selected.
pub const ALL_TOOLS_LABEL: &str = "All Tools";

/// Display label for a directory: its path segments relative to the root,
/// joined by ` > `.
pub fn category_label(root: &StorageRoot, dir: &Path) -> String {
    let rel = match dir.strip_prefix(root.path()) {
        Ok(rel) => rel,
        Err(_) => return ALL_TOOLS_LABEL.to_string(),
    };
    let parts: Vec<String> = rel
        .components()
        .map(|part| part.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        ALL_TOOLS_LABEL.to_string()
    } else {
        parts.join(" > ")
    }
}

/// Read-only scanner over the storage root.
pub struct Scanner<'a> {
    root: &'a StorageRoot,
    config: &'a ConfigStore,
    records: &'a MetadataStore,
    extensions: HashSet<String>,
}

impl<'a> Scanner<'a> {
    pub fn new(root: &'a StorageRoot, config: &'a ConfigStore, records: &'a MetadataStore) -> Self {
        let extensions = config
            .general()
            .supported_extensions
            .iter()
            .map(|ext| {
                let ext = ext.trim().to_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Self {
            root,
            config,
            records,
            extensions,
        }
    }

    /// Scans a single directory, non-recursively. Missing or unreadable
    /// directories degrade to an empty list.
    pub fn scan_one(&self, dir: &Path, category_label: &str) -> Vec<ToolEntry> {
        let mut tools = Vec::new();
        if !dir.is_dir() {
            tracing::warn!(dir = ?dir, "scan target is not a readable directory");
            return tools;
        }
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(dir = ?dir, error = %err, "failed to read directory");
                return tools;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || !self.is_supported(&path) {
                continue;
            }
            if let Some(tool) = self.build_entry(&path, category_label) {
                tools.push(tool);
            }
        }
        tools.sort_by_key(|tool| tool.name.to_lowercase());
        tools
    }

    /// Scans a main-category directory: its direct files plus the files of
    /// each immediate subdirectory. Exactly one extra level, never deeper.
    pub fn scan_main(&self, dir: &Path) -> Vec<ToolEntry> {
        let mut tools = self.scan_one(dir, &category_label(self.root, dir));
        let mut subdirs: Vec<_> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect(),
            Err(err) => {
                tracing::warn!(dir = ?dir, error = %err, "failed to list subdirectories");
                Vec::new()
            }
        };
        subdirs.sort_by_key(|sub| sub.file_name().map(|n| n.to_ascii_lowercase()));
        for sub in subdirs {
            tools.extend(self.scan_one(&sub, &category_label(self.root, &sub)));
        }
        tools
    }

    /// Recursive walk over the whole storage root.
    pub fn scan_all(&self) -> Vec<ToolEntry> {
        let mut tools = Vec::new();
        for entry in WalkDir::new(self.root.path()) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "walk error under storage root");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !self.is_supported(path) {
                continue;
            }
            let label = path
                .parent()
                .map(|dir| category_label(self.root, dir))
                .unwrap_or_else(|| ALL_TOOLS_LABEL.to_string());
            if let Some(tool) = self.build_entry(path, &label) {
                tools.push(tool);
            }
        }
        tools.sort_by(|a, b| {
            (a.category.as_str(), a.name.to_lowercase())
                .cmp(&(b.category.as_str(), b.name.to_lowercase()))
        });
        tools
    }

    fn is_supported(&self, path: &Path) -> bool {
        if path
            .file_name()
            .map(|name| name == CATEGORY_MARKER)
            .unwrap_or(false)
        {
            return false;
        }
        path.extension()
            .map(|ext| {
                let ext = format!(".{}", ext.to_string_lossy().to_lowercase());
                self.extensions.contains(&ext)
            })
            .unwrap_or(false)
    }

    fn build_entry(&self, path: &Path, category_label: &str) -> Option<ToolEntry> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::warn!(path = ?path, error = %err, "failed to stat tool file");
                return None;
            }
        };
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let record = self.records.get(self.root, path);
        let name = self
            .config
            .custom_name(path)
            .or_else(|| {
                record
                    .map(|record| record.name.clone())
                    .filter(|name| !name.is_empty())
            })
            .unwrap_or(stem);
        let note = self
            .config
            .custom_note(path)
            .or_else(|| {
                record
                    .map(|record| record.note.clone())
                    .filter(|note| !note.is_empty())
            })
            .unwrap_or_default();
        let modified = metadata
            .modified()
            .ok()
            .map(DateTime::<Local>::from);
        Some(ToolEntry {
            name,
            path: path.to_path_buf(),
            kind: ToolKind::from_extension(&extension),
            extension,
            size: metadata.len(),
            category: category_label.to_string(),
            modified,
            note,
        })
    }
}
