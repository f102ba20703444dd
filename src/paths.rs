//! Storage-root path containment and record-key normalization.
//!
//! Every path the catalog touches is validated against a single storage
//! root. Record keys are stored relative to that root where possible so the
//! whole toolbox directory can be relocated without invalidating records.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// The single directory all categories and tools live under.
///
/// Also acts as the path guard: `resolve` clamps any candidate that would
/// escape the root back to the root itself, so callers always operate on an
/// in-root path.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    root: PathBuf,
}

impl StorageRoot {
    /// Creates the root directory if absent and canonicalizes it.
    pub fn open(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create storage root {:?}", root))?;
        let root = fs::canonicalize(&root)
            .with_context(|| format!("Failed to canonicalize storage root {:?}", root))?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolves `candidate` to an absolute, lexically normalized path.
    ///
    /// Relative candidates are joined to the root first. A result that does
    /// not sit inside the root is clamped to the root itself rather than
    /// rejected: the catalog must always have something valid to show.
    pub fn resolve(&self, candidate: &Path) -> PathBuf {
        let absolute = if candidate.is_absolute() {
            normalize_lexically(candidate)
        } else {
            normalize_lexically(&self.root.join(candidate))
        };
        if absolute.starts_with(&self.root) {
            absolute
        } else {
            self.root.clone()
        }
    }

    /// Whether `path` (after lexical normalization) sits inside the root.
    pub fn contains(&self, path: &Path) -> bool {
        normalize_lexically(path).starts_with(&self.root)
    }

    /// Derives the normalized store key for a path.
    ///
    /// Paths inside the root are keyed by their relative form so records
    /// survive a root relocation; anything else falls back to the absolute
    /// path. The result is separator-canonicalized and case-folded, and the
    /// same folding is applied on every lookup.
    pub fn key_for(&self, path: &Path) -> String {
        let absolute = if path.is_absolute() {
            normalize_lexically(path)
        } else {
            normalize_lexically(&self.root.join(path))
        };
        let keyed = match absolute.strip_prefix(&self.root) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
            _ => absolute,
        };
        normalize_key(&keyed.to_string_lossy())
    }

    /// Resolves a stored key back to an absolute path.
    ///
    /// Relative keys are joined to the root and must remain inside it;
    /// absolute keys are used as-is but must also sit inside the root.
    /// Returns `None` for keys that escape — those records are unsafe and
    /// get pruned.
    pub fn resolve_key(&self, key: &str) -> Option<PathBuf> {
        let candidate = Path::new(key);
        let absolute = if candidate.is_absolute() {
            normalize_lexically(candidate)
        } else {
            normalize_lexically(&self.root.join(candidate))
        };
        if absolute.starts_with(&self.root) {
            Some(absolute)
        } else {
            None
        }
    }

    /// Resolves a stored key to an existing path inside the root.
    ///
    /// Keys are case-folded, so on a case-sensitive filesystem the folded
    /// spelling may not exist literally even though the file does. When the
    /// lexical resolution is missing, each component is matched against the
    /// actual directory entries under the same folding, and the real-case
    /// path is returned. `None` means the key escapes the root or no entry
    /// matches.
    pub fn locate_key(&self, key: &str) -> Option<PathBuf> {
        let resolved = self.resolve_key(key)?;
        if resolved.exists() {
            return Some(resolved);
        }
        // resolve_key already confined the path to the root, so the
        // relative remainder covers absolute keys too.
        let rel = resolved.strip_prefix(&self.root).ok()?;
        let mut current = self.root.clone();
        for component in rel.components() {
            let wanted = normalize_key(&component.as_os_str().to_string_lossy());
            let matched = fs::read_dir(&current)
                .ok()?
                .flatten()
                .map(|entry| entry.file_name())
                .find(|name| normalize_key(&name.to_string_lossy()) == wanted)?;
            current.push(matched);
        }
        Some(current)
    }
}

/// Canonical key form: forward-slash separators, trimmed, case-folded.
///
/// Applied identically on every write and every read; a key that skips this
/// normalization will never be found again.
pub fn normalize_key(raw: &str) -> String {
    raw.replace('\\', "/").trim().to_lowercase()
}

/// Lexical normalization: removes `.` components and resolves `..` without
/// touching the filesystem, so missing files can still be normalized.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut components = path.components().peekable();
    let mut normalized = if let Some(component @ Component::Prefix(..)) = components.peek() {
        let prefix = PathBuf::from(component.as_os_str());
        components.next();
        prefix
    } else {
        PathBuf::new()
    };
    for component in components {
        match component {
            Component::Prefix(..) => {}
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}
