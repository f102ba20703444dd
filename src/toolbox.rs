//! The toolbox context: one explicitly constructed object owning the storage
//! root, the config document, and both persisted stores. All mutations flow
//! through it on a single thread.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use directories::BaseDirs;

use crate::categories::{self, CategoryNode, CategoryTree};
use crate::config::{ConfigStore, CONFIG_FILE_NAME};
use crate::paths::StorageRoot;
use crate::records::{MetadataStore, PruneReport};
use crate::scanner::{category_label, Scanner, ALL_TOOLS_LABEL};
use crate::usage::{UsageStore, USAGE_FILE_NAME};
use crate::view::{apply_filter, CatalogPage, Selection, ViewFilter};

pub const STORAGE_DIR_NAME: &str = "Storage";

/// Returns the home directory all toolbox state lives under.
///
/// Order of precedence:
/// 1. `TOOLCHEST_HOME` environment variable.
/// 2. OS-specific data directory via `directories::BaseDirs`.
pub fn home_dir() -> Result<PathBuf> {
    if let Ok(path) = env::var("TOOLCHEST_HOME") {
        return Ok(PathBuf::from(path));
    }
    let base_dirs = BaseDirs::new().context("Unable to determine OS data directory")?;
    Ok(base_dirs.data_dir().join("ToolChest"))
}

/// Convenience struct exposing the important workspace paths.
#[derive(Debug, Clone)]
pub struct ToolboxPaths {
    pub home: PathBuf,
    pub config_file: PathBuf,
    pub usage_file: PathBuf,
    pub storage_dir: PathBuf,
}

impl ToolboxPaths {
    pub fn resolve() -> Result<Self> {
        let home = home_dir()?;
        Ok(Self {
            config_file: home.join(CONFIG_FILE_NAME),
            usage_file: home.join(USAGE_FILE_NAME),
            storage_dir: home.join(STORAGE_DIR_NAME),
            home,
        })
    }
}

/// Owner of all catalog state.
pub struct Toolbox {
    pub paths: ToolboxPaths,
    pub root: StorageRoot,
    pub config: ConfigStore,
    pub records: MetadataStore,
    pub usage: UsageStore,
}

impl Toolbox {
    /// Opens (creating on first run) the workspace: home directory, storage
    /// root, config document, and both stores.
    pub fn open() -> Result<Self> {
        let paths = ToolboxPaths::resolve()?;
        std::fs::create_dir_all(&paths.home)
            .with_context(|| format!("Failed to create toolbox home {:?}", paths.home))?;
        let root = StorageRoot::open(paths.storage_dir.clone())?;
        let mut config = ConfigStore::load_or_create(&paths.config_file)?;
        let records = MetadataStore::load(&mut config, &root);
        let usage = UsageStore::load(&paths.usage_file);
        Ok(Self {
            paths,
            root,
            config,
            records,
            usage,
        })
    }

    /// Mutation handle for the category tree.
    pub fn categories(&mut self) -> CategoryTree<'_> {
        CategoryTree::new(&mut self.config, &self.root)
    }

    /// Ordered snapshot of the category tree.
    pub fn category_nodes(&self) -> Vec<CategoryNode> {
        categories::list_categories(&self.config)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.config.general().scan_interval_secs)
    }

    /// Runs the shared prune pass over records, overrides, and usage.
    pub fn prune(&mut self) -> PruneReport {
        let report = self
            .records
            .prune(&mut self.config, &mut self.usage, &self.root);
        if !report.is_clean() {
            tracing::debug!(
                records = report.records_removed,
                overrides = report.overrides_removed,
                usage = report.usage_removed,
                "prune pass removed stale entries"
            );
        }
        report
    }

    /// Loads the visible tool set for a selection: prunes, scans at the
    /// selection's depth, creates records for newly discovered files, then
    /// applies the active filters.
    pub fn load_catalog(&mut self, selection: &Selection, filter: &ViewFilter) -> Result<CatalogPage> {
        self.prune();
        let (tools, label) = match selection {
            Selection::AllTools => {
                let scanner = Scanner::new(&self.root, &self.config, &self.records);
                (scanner.scan_all(), ALL_TOOLS_LABEL.to_string())
            }
            Selection::Main(ordinal) => {
                let dir = categories::category_dir(&self.config, &self.root, *ordinal)
                    .with_context(|| format!("Unknown category ordinal {ordinal}"))?;
                let dir = self.root.resolve(&dir);
                let scanner = Scanner::new(&self.root, &self.config, &self.records);
                let label = category_label(&self.root, &dir);
                (scanner.scan_main(&dir), label)
            }
            Selection::Sub { main, sub } => {
                let dir = categories::subcategory_dir(&self.config, &self.root, *main, *sub)
                    .with_context(|| format!("Unknown subcategory ordinal {main}_{sub}"))?;
                let dir = self.root.resolve(&dir);
                let scanner = Scanner::new(&self.root, &self.config, &self.records);
                let label = category_label(&self.root, &dir);
                (scanner.scan_one(&dir, &label), label)
            }
            Selection::Path(path) => {
                let dir = self.root.resolve(path);
                let depth = dir
                    .strip_prefix(self.root.path())
                    .map(|rel| rel.components().count())
                    .unwrap_or(0);
                let scanner = Scanner::new(&self.root, &self.config, &self.records);
                let label = category_label(&self.root, &dir);
                let tools = if depth == 1 {
                    scanner.scan_main(&dir)
                } else {
                    scanner.scan_one(&dir, &label)
                };
                (tools, label)
            }
        };
        if self.config.general().auto_record {
            for tool in &tools {
                self.records.ensure_record(
                    &mut self.config,
                    &self.root,
                    &tool.path,
                    &tool.name,
                    &tool.category,
                    &tool.note,
                );
            }
        }
        let tools = apply_filter(filter, tools);
        Ok(CatalogPage {
            count: tools.len(),
            label,
            tools,
        })
    }

    /// Collaborator entry point for drop operations and run services.
    pub fn ensure_record(&mut self, path: &Path, name: &str, category: &str, note: &str) {
        self.records
            .ensure_record(&mut self.config, &self.root, path, name, category, note);
    }

    /// User edit: persisted display name plus its override entry.
    pub fn rename_tool(&mut self, path: &Path, name: &str) {
        self.records
            .update_name(&mut self.config, &self.root, path, name);
    }

    /// User edit: persisted note plus its override entry.
    pub fn update_tool_note(&mut self, path: &Path, note: &str) {
        self.records
            .update_note(&mut self.config, &self.root, path, note);
    }

    /// Deletes a tool file and all of its persisted traces.
    pub fn delete_tool(&mut self, path: &Path) -> Result<()> {
        let resolved = self.root.resolve(path);
        if resolved == self.root.path() {
            bail!("Refusing to delete the storage root");
        }
        self.records
            .delete(&mut self.config, &mut self.usage, &self.root, &resolved)
    }

    /// Records one run of a tool.
    pub fn record_usage(&mut self, path: &Path, name: &str, category: &str) {
        self.usage.record_usage(path, name, category);
    }
}
