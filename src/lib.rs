pub mod categories;
pub mod config;
pub mod monitor;
pub mod paths;
pub mod records;
pub mod scanner;
pub mod tool;
pub mod toolbox;
pub mod usage;
pub mod view;

// Re-export commonly used types for convenience.
pub use categories::{CategoryNode, CategoryTree, SubcategoryNode};
pub use config::{CatalogConfig, ConfigStore, GeneralSettings, CONFIG_FILE_NAME};
pub use monitor::{RefreshScheduler, RefreshSignal};
pub use paths::StorageRoot;
pub use records::{MetadataStore, PruneReport};
pub use scanner::{Scanner, ALL_TOOLS_LABEL};
pub use tool::{
    format_size, probe_version, ToolEntry, ToolKind, ToolRecord, VERSION_NOT_APPLICABLE,
    VERSION_UNKNOWN,
};
pub use toolbox::{home_dir, Toolbox, ToolboxPaths};
pub use usage::{UsageRecord, UsageStore, USAGE_FILE_NAME};
pub use view::{CatalogPage, Selection, ViewFilter};
