//! Tool entry and record shapes shared by the scanner and the stores.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp format used in persisted records and the usage file.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Version placeholder for extensions the probe does not apply to.
pub const VERSION_NOT_APPLICABLE: &str = "-";
/// Version placeholder when extraction applies but fails.
pub const VERSION_UNKNOWN: &str = "unknown";

pub(crate) fn timestamp_now() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

/// Coarse classification of a tool by its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Archive,
    Executable,
    Script,
    Registry,
    Shortcut,
    Document,
    Image,
    Media,
    Other,
}

impl ToolKind {
    /// Classifies an extension (with or without the leading dot).
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "xz" => ToolKind::Archive,
            "exe" | "msi" | "com" => ToolKind::Executable,
            "bat" | "cmd" | "ps1" | "vbs" | "py" | "pyw" | "sh" => ToolKind::Script,
            "reg" => ToolKind::Registry,
            "lnk" => ToolKind::Shortcut,
            "txt" | "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "md" | "html" => {
                ToolKind::Document
            }
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "ico" => ToolKind::Image,
            "mp4" | "mp3" | "wav" | "avi" | "mkv" => ToolKind::Media,
            _ => ToolKind::Other,
        }
    }

    /// Stable label used in persisted records and type filters.
    pub fn label(self) -> &'static str {
        match self {
            ToolKind::Archive => "archive",
            ToolKind::Executable => "executable",
            ToolKind::Script => "script",
            ToolKind::Registry => "registry",
            ToolKind::Shortcut => "shortcut",
            ToolKind::Document => "document",
            ToolKind::Image => "image",
            ToolKind::Media => "media",
            ToolKind::Other => "other",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "archive" => Some(ToolKind::Archive),
            "executable" => Some(ToolKind::Executable),
            "script" => Some(ToolKind::Script),
            "registry" => Some(ToolKind::Registry),
            "shortcut" => Some(ToolKind::Shortcut),
            "document" => Some(ToolKind::Document),
            "image" => Some(ToolKind::Image),
            "media" => Some(ToolKind::Media),
            "other" => Some(ToolKind::Other),
            _ => None,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Transient view of one tool, rebuilt on every scan.
///
/// Never persisted: the scanner merges a filesystem stat with the metadata
/// record and display overrides for the same path.
#[derive(Debug, Clone)]
pub struct ToolEntry {
    pub name: String,
    pub path: PathBuf,
    /// Lowercased extension with the leading dot, e.g. `.exe`.
    pub extension: String,
    pub kind: ToolKind,
    pub size: u64,
    /// Display label of the category the file was found under.
    pub category: String,
    pub modified: Option<DateTime<Local>>,
    pub note: String,
}

/// Persisted metadata for one tool, keyed by its normalized path key.
///
/// Serialized as the six-field pipe string
/// `name|category|add_time|type|note|version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRecord {
    pub name: String,
    pub category: String,
    pub add_time: String,
    pub kind: String,
    pub note: String,
    pub version: String,
}

impl ToolRecord {
    /// Parses a persisted row. Anything other than exactly six fields is
    /// malformed and treated as absent.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.split('|').collect();
        if parts.len() != 6 {
            return None;
        }
        Some(Self {
            name: parts[0].to_string(),
            category: parts[1].to_string(),
            add_time: parts[2].to_string(),
            kind: parts[3].to_string(),
            note: parts[4].to_string(),
            version: parts[5].to_string(),
        })
    }

    pub fn to_field_string(&self) -> String {
        [
            &self.name,
            &self.category,
            &self.add_time,
            &self.kind,
            &self.note,
            &self.version,
        ]
        .iter()
        .map(|field| field.replace('|', "/"))
        .collect::<Vec<_>>()
        .join("|")
    }
}

/// Human-readable byte size.
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if size < KB {
        format!("{} B", size)
    } else if size < MB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else if size < GB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else {
        format!("{:.2} GB", size as f64 / GB as f64)
    }
}

/// Best-effort version string for a tool file.
///
/// Only executable/installer extensions carry embedded version metadata;
/// everything else gets the not-applicable placeholder. Probe failures are
/// non-fatal and yield the unknown placeholder.
pub fn probe_version(path: &Path) -> String {
    let applicable = path
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "exe" || ext == "msi"
        })
        .unwrap_or(false);
    if !applicable {
        return VERSION_NOT_APPLICABLE.to_string();
    }
    match read_version_info(path) {
        Some(version) => version,
        None => VERSION_UNKNOWN.to_string(),
    }
}

#[cfg(windows)]
fn read_version_info(path: &Path) -> Option<String> {
    use std::process::Command;
    let literal = path.to_string_lossy().replace('\'', "''");
    let script = format!("(Get-Item -LiteralPath '{literal}').VersionInfo.FileVersion");
    let output = Command::new("powershell")
        .args(["-NoProfile", "-Command", &script])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if version.is_empty() {
        None
    } else {
        Some(version)
    }
}

#[cfg(not(windows))]
fn read_version_info(_path: &Path) -> Option<String> {
    None
}
