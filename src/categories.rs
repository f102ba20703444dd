//! Two-level category hierarchy mapped onto storage-root directories.
//!
//! Ordinals are contiguous starting at 1; every mutation does the filesystem
//! operation first and commits the config change only when it succeeded, so
//! config and directories never disagree for longer than one operation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::config::ConfigStore;
use crate::paths::StorageRoot;

/// Marker file dropped into every category directory; the scanner excludes
/// it by name.
pub const CATEGORY_MARKER: &str = ".category";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcategoryNode {
    pub ordinal: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    pub ordinal: u32,
    pub name: String,
    pub subcategories: Vec<SubcategoryNode>,
}

/// Ordered category list derived from the config sections.
pub fn list_categories(config: &ConfigStore) -> Vec<CategoryNode> {
    let count = config.category_count();
    (1..=count)
        .map(|ordinal| {
            let name = config
                .category_name(ordinal)
                .unwrap_or_else(|| format!("Category {ordinal}"));
            let subcategories = config
                .subcategory_ordinals(ordinal)
                .into_iter()
                .filter_map(|sub| {
                    config.subcategory_name(ordinal, sub).map(|name| SubcategoryNode {
                        ordinal: sub,
                        name,
                    })
                })
                .collect();
            CategoryNode {
                ordinal,
                name,
                subcategories,
            }
        })
        .collect()
}

/// Directory backing a main category, if the ordinal is known.
pub fn category_dir(config: &ConfigStore, root: &StorageRoot, ordinal: u32) -> Option<PathBuf> {
    config
        .category_name(ordinal)
        .map(|name| root.path().join(name))
}

/// Directory backing a subcategory, if both ordinals are known.
pub fn subcategory_dir(
    config: &ConfigStore,
    root: &StorageRoot,
    main: u32,
    sub: u32,
) -> Option<PathBuf> {
    let main_name = config.category_name(main)?;
    let sub_name = config.subcategory_name(main, sub)?;
    Some(root.path().join(main_name).join(sub_name))
}

/// Mutation handle over the category tree.
pub struct CategoryTree<'a> {
    config: &'a mut ConfigStore,
    root: &'a StorageRoot,
}

impl<'a> CategoryTree<'a> {
    pub fn new(config: &'a mut ConfigStore, root: &'a StorageRoot) -> Self {
        Self { config, root }
    }

    pub fn list(&self) -> Vec<CategoryNode> {
        list_categories(self.config)
    }

    pub fn dir_for(&self, ordinal: u32) -> Option<PathBuf> {
        category_dir(self.config, self.root, ordinal)
    }

    pub fn dir_for_sub(&self, main: u32, sub: u32) -> Option<PathBuf> {
        subcategory_dir(self.config, self.root, main, sub)
    }

    /// Adds a main category and creates its directory. Returns the ordinal.
    pub fn add_main(&mut self, name: &str) -> Result<u32> {
        let name = valid_name(name)?;
        create_category_dir(&self.root.path().join(&name))?;
        let ordinal = self.config.category_count() + 1;
        self.config.set_category_name(ordinal, &name);
        self.config.set_category_count(ordinal);
        self.config.save()?;
        Ok(ordinal)
    }

    /// Renames a main category together with its backing directory.
    pub fn rename_main(&mut self, ordinal: u32, new_name: &str) -> Result<()> {
        let new_name = valid_name(new_name)?;
        let old_name = self.require_main(ordinal)?;
        if old_name == new_name {
            return Ok(());
        }
        let old_dir = self.root.path().join(&old_name);
        let new_dir = self.root.path().join(&new_name);
        if old_dir.exists() {
            fs::rename(&old_dir, &new_dir)
                .with_context(|| format!("Failed to rename {:?} to {:?}", old_dir, new_dir))?;
        }
        self.config.set_category_name(ordinal, &new_name);
        self.config.save()?;
        Ok(())
    }

    /// Deletes a main category, re-numbering later ordinals to stay gap-free
    /// (including the main ordinal embedded in subcategory keys). The backing
    /// directory tree is only removed when `delete_dir` is set; that removal
    /// is irreversible.
    pub fn delete_main(&mut self, ordinal: u32, delete_dir: bool) -> Result<()> {
        let name = self.require_main(ordinal)?;
        if delete_dir {
            let dir = self.root.path().join(&name);
            if dir.exists() {
                fs::remove_dir_all(&dir)
                    .with_context(|| format!("Failed to delete category directory {:?}", dir))?;
            }
        }
        let count = self.config.category_count();
        for shifted in ordinal..count {
            if let Some(next) = self.config.category_name(shifted + 1) {
                self.config.set_category_name(shifted, &next);
            }
        }
        self.config.remove_category_name(count);
        self.config.set_category_count(count.saturating_sub(1));

        // Re-key the subcategory section: drop this main's entries, shift the
        // embedded main ordinal for everything after it.
        let mut rekeyed = BTreeMap::new();
        for (key, value) in self.config.subcategories() {
            let Some((main_part, sub_part)) = key.split_once('_') else {
                rekeyed.insert(key.clone(), value.clone());
                continue;
            };
            let Ok(main) = main_part.parse::<u32>() else {
                rekeyed.insert(key.clone(), value.clone());
                continue;
            };
            if main == ordinal {
                continue;
            }
            let new_main = if main > ordinal { main - 1 } else { main };
            rekeyed.insert(format!("{new_main}_{sub_part}"), value.clone());
        }
        self.config.replace_subcategories(rekeyed);
        self.config.save()?;
        Ok(())
    }

    /// Adds a subcategory under a main category. Returns its ordinal.
    pub fn add_sub(&mut self, main: u32, name: &str) -> Result<u32> {
        let name = valid_name(name)?;
        let main_name = self.require_main(main)?;
        create_category_dir(&self.root.path().join(&main_name).join(&name))?;
        let ordinal = self.config.subcategory_ordinals(main).len() as u32 + 1;
        self.config.set_subcategory_name(main, ordinal, &name);
        self.config.save()?;
        Ok(ordinal)
    }

    pub fn rename_sub(&mut self, main: u32, sub: u32, new_name: &str) -> Result<()> {
        let new_name = valid_name(new_name)?;
        let main_name = self.require_main(main)?;
        let old_name = self.require_sub(main, sub)?;
        if old_name == new_name {
            return Ok(());
        }
        let old_dir = self.root.path().join(&main_name).join(&old_name);
        let new_dir = self.root.path().join(&main_name).join(&new_name);
        if old_dir.exists() {
            fs::rename(&old_dir, &new_dir)
                .with_context(|| format!("Failed to rename {:?} to {:?}", old_dir, new_dir))?;
        }
        self.config.set_subcategory_name(main, sub, &new_name);
        self.config.save()?;
        Ok(())
    }

    pub fn delete_sub(&mut self, main: u32, sub: u32, delete_dir: bool) -> Result<()> {
        let main_name = self.require_main(main)?;
        let name = self.require_sub(main, sub)?;
        if delete_dir {
            let dir = self.root.path().join(&main_name).join(&name);
            if dir.exists() {
                fs::remove_dir_all(&dir).with_context(|| {
                    format!("Failed to delete subcategory directory {:?}", dir)
                })?;
            }
        }
        let ordinals = self.config.subcategory_ordinals(main);
        let last = ordinals.last().copied().unwrap_or(sub);
        for shifted in sub..last {
            if let Some(next) = self.config.subcategory_name(main, shifted + 1) {
                self.config.set_subcategory_name(main, shifted, &next);
            }
        }
        self.config.remove_subcategory_name(main, last);
        self.config.save()?;
        Ok(())
    }

    fn require_main(&self, ordinal: u32) -> Result<String> {
        if ordinal == 0 || ordinal > self.config.category_count() {
            bail!("Unknown category ordinal {ordinal}");
        }
        self.config
            .category_name(ordinal)
            .with_context(|| format!("Category ordinal {ordinal} has no name entry"))
    }

    fn require_sub(&self, main: u32, sub: u32) -> Result<String> {
        self.config
            .subcategory_name(main, sub)
            .with_context(|| format!("Unknown subcategory ordinal {main}_{sub}"))
    }
}

/// Category names become directory names, so they must be single path
/// segments.
fn valid_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Category name must not be empty");
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        bail!("Category name must be a plain directory name: {name:?}");
    }
    Ok(name.to_string())
}

fn create_category_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create category directory {:?}", dir))?;
    let marker = dir.join(CATEGORY_MARKER);
    if !marker.exists() {
        fs::write(&marker, b"")
            .with_context(|| format!("Failed to write category marker {:?}", marker))?;
    }
    Ok(())
}
